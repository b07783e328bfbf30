//! CLI commands.

mod cluster;
mod config;
mod depot;
mod task;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vlcm_vapi::{Client, ClientConfig};

use crate::config::Config;
use crate::output::OutputFormat;

/// vSphere Lifecycle Manager CLI - offline depots and cluster software drafts.
#[derive(Debug, Parser)]
#[command(name = "vlcmctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// vCenter URL, e.g. https://vc.example.com.
    #[arg(long, global = true, env = "VLCM_URL")]
    url: Option<String>,

    /// Existing vAPI session token.
    #[arg(long, global = true, env = "VLCM_SESSION_ID", hide_env_values = true)]
    session_id: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long, global = true, env = "VLCM_INSECURE", overrides_with = "no_insecure")]
    insecure: bool,

    /// Verify TLS certificates even if the saved config skips verification.
    #[arg(long, global = true, overrides_with = "insecure")]
    no_insecure: bool,

    /// Log requests and task polling to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage offline depots and browse depot content.
    Depot(depot::DepotCommand),

    /// Manage cluster software drafts.
    Cluster(cluster::ClusterCommand),

    /// Inspect and wait for asynchronous tasks.
    Task(task::TaskCommand),

    /// Show or change saved connection settings.
    Config(config::ConfigCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// `Some` only when `--insecure` or `--no-insecure` was given.
    fn insecure_override(&self) -> Option<bool> {
        if self.no_insecure {
            Some(false)
        } else if self.insecure {
            Some(true)
        } else {
            None
        }
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;

        let ctx = CommandContext {
            config,
            format: self.format,
            insecure: self.insecure_override(),
            url: self.url,
            session_id: self.session_id,
        };

        match self.command {
            Commands::Depot(cmd) => cmd.run(ctx).await,
            Commands::Cluster(cmd) => cmd.run(ctx).await,
            Commands::Task(cmd) => cmd.run(ctx).await,
            Commands::Config(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("vlcmctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
    pub url: Option<String>,
    pub session_id: Option<String>,
    /// TLS verification override from flags; `None` defers to the config.
    pub insecure: Option<bool>,
}

impl CommandContext {
    /// Connection settings, preferring flags over the saved config.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(
            self.url
                .clone()
                .unwrap_or_else(|| self.config.api_url.clone()),
        );
        config.session_id = self
            .session_id
            .clone()
            .or_else(|| self.config.session_id.clone());
        config.insecure = self.insecure.unwrap_or(self.config.insecure);
        config
    }

    /// Get a REST client for the configured vCenter.
    pub fn client(&self) -> Result<Client> {
        let config = self.client_config();
        tracing::debug!(
            url = %config.base_url,
            insecure = config.insecure,
            has_session = config.session_id.is_some(),
            "building API client"
        );
        Ok(Client::new(&config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn context(cli: Cli, config: Config) -> CommandContext {
        CommandContext {
            config,
            format: cli.format,
            insecure: cli.insecure_override(),
            url: cli.url,
            session_id: cli.session_id,
        }
    }

    #[test]
    fn flags_override_saved_config() {
        let cli = parse(&[
            "vlcmctl",
            "--url",
            "https://vc.example.com",
            "--session-id",
            "flag-session",
            "depot",
            "offline",
            "ls",
        ]);
        let saved = Config {
            api_url: "https://saved.example.com".to_string(),
            insecure: true,
            session_id: Some("saved-session".to_string()),
        };

        let config = context(cli, saved).client_config();

        assert_eq!(config.base_url, "https://vc.example.com");
        assert_eq!(config.session_id.as_deref(), Some("flag-session"));
        assert!(config.insecure);
    }

    #[test]
    fn saved_config_fills_missing_flags() {
        let cli = Cli {
            format: OutputFormat::Text,
            url: None,
            session_id: None,
            insecure: false,
            no_insecure: false,
            verbose: false,
            command: Commands::Version,
        };
        let saved = Config {
            api_url: "https://saved.example.com".to_string(),
            insecure: false,
            session_id: Some("saved-session".to_string()),
        };

        let config = context(cli, saved).client_config();

        assert_eq!(config.base_url, "https://saved.example.com");
        assert_eq!(config.session_id.as_deref(), Some("saved-session"));
        assert!(!config.insecure);
    }

    #[test]
    fn no_insecure_overrides_saved_config() {
        let cli = parse(&["vlcmctl", "--no-insecure", "depot", "offline", "ls"]);
        let saved = Config {
            insecure: true,
            ..Config::default()
        };

        assert!(!context(cli, saved).client_config().insecure);
    }

    #[test]
    fn last_tls_flag_wins() {
        let cli = parse(&["vlcmctl", "--no-insecure", "--insecure", "version"]);
        assert_eq!(cli.insecure_override(), Some(true));

        let cli = parse(&["vlcmctl", "--insecure", "--no-insecure", "version"]);
        assert_eq!(cli.insecure_override(), Some(false));
    }

    #[test]
    fn format_flag_is_global() {
        let cli = parse(&["vlcmctl", "task", "info", "--task-id", "t-1", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["vlcmctl", "--format", "yaml", "version"]).is_err());
    }
}
