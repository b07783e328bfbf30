//! Config commands (saved connection settings).

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::config::{config_path, Config};
use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

/// Manage saved connection settings.
#[derive(Debug, Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand)]
enum ConfigSubcommand {
    /// Show the saved settings.
    Show,

    /// Save the connection flags given on this command line
    /// (--url, --session-id, --insecure or --no-insecure).
    Set,

    /// Reset the saved settings to the defaults.
    Clear,
}

#[derive(Debug, Serialize)]
struct ConfigView {
    path: String,
    api_url: String,
    insecure: bool,
    session_id: &'static str,
}

impl ConfigView {
    fn new(config: &Config, path: String) -> Self {
        Self {
            path,
            api_url: config.api_url.clone(),
            insecure: config.insecure,
            session_id: if config.session_id.is_some() { "set" } else { "-" },
        }
    }
}

impl ConfigCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ConfigSubcommand::Show => show(ctx),
            ConfigSubcommand::Set => set(ctx),
            ConfigSubcommand::Clear => clear(ctx),
        }
    }
}

fn show(ctx: CommandContext) -> Result<()> {
    let path = config_path()?.display().to_string();
    let view = ConfigView::new(&ctx.config, path);

    match ctx.format {
        OutputFormat::Json => print_single(&view, ctx.format),
        OutputFormat::Text | OutputFormat::Table => {
            println!("path: {}", view.path);
            println!("api_url: {}", view.api_url);
            println!("insecure: {}", view.insecure);
            println!("session_id: {}", view.session_id);
        }
    }

    Ok(())
}

/// Apply the connection flags of this invocation to the saved config.
fn merge_flags(mut config: Config, ctx: &CommandContext) -> Result<Config> {
    if ctx.url.is_none() && ctx.session_id.is_none() && ctx.insecure.is_none() {
        anyhow::bail!("Nothing to save. Pass --url, --session-id, --insecure or --no-insecure.");
    }

    if let Some(url) = &ctx.url {
        url::Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid --url '{}': {}", url, e))?;
        config.api_url = url.clone();
    }
    if let Some(session_id) = &ctx.session_id {
        config.session_id = Some(session_id.clone());
    }
    if let Some(insecure) = ctx.insecure {
        config.insecure = insecure;
    }

    Ok(config)
}

fn set(ctx: CommandContext) -> Result<()> {
    let config = merge_flags(ctx.config.clone(), &ctx)?;
    config.save()?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "ok": true }), ctx.format),
        OutputFormat::Text | OutputFormat::Table => print_success("Saved connection settings"),
    }

    Ok(())
}

fn clear(ctx: CommandContext) -> Result<()> {
    Config::default().save()?;

    match ctx.format {
        OutputFormat::Json => print_single(&serde_json::json!({ "ok": true }), ctx.format),
        OutputFormat::Text | OutputFormat::Table => print_success("Cleared saved settings"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(url: Option<&str>, session_id: Option<&str>, insecure: Option<bool>) -> CommandContext {
        CommandContext {
            config: Config::default(),
            format: OutputFormat::Text,
            url: url.map(str::to_string),
            session_id: session_id.map(str::to_string),
            insecure,
        }
    }

    #[test]
    fn merge_requires_a_flag() {
        let ctx = context(None, None, None);
        assert!(merge_flags(Config::default(), &ctx).is_err());
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let saved = Config {
            api_url: "https://saved.example.com".to_string(),
            insecure: true,
            session_id: Some("saved-session".to_string()),
        };
        let ctx = context(None, Some("new-session"), None);

        let merged = merge_flags(saved, &ctx).unwrap();

        assert_eq!(merged.api_url, "https://saved.example.com");
        assert_eq!(merged.session_id.as_deref(), Some("new-session"));
        assert!(merged.insecure);
    }

    #[test]
    fn merge_can_turn_insecure_off() {
        let saved = Config {
            insecure: true,
            ..Config::default()
        };
        let ctx = context(None, None, Some(false));

        let merged = merge_flags(saved, &ctx).unwrap();

        assert!(!merged.insecure);
    }

    #[test]
    fn merge_rejects_invalid_url() {
        let ctx = context(Some("not a url"), None, None);
        assert!(merge_flags(Config::default(), &ctx).is_err());
    }

    #[test]
    fn view_hides_session_token() {
        let config = Config {
            session_id: Some("secret".to_string()),
            ..Config::default()
        };
        let view = ConfigView::new(&config, "/tmp/config.json".to_string());
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("secret"));
        assert_eq!(view.session_id, "set");
    }
}
