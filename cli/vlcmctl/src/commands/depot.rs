//! Depot commands (offline depots and depot content).

use std::collections::BTreeMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use tabled::Tabled;
use vlcm_vapi::depots::{
    DepotComponentFilter, DepotContentComponent, Manager, OfflineDepotCreateSpec, OfflineDepotInfo,
    SourceType,
};

use crate::error::CliError;
use crate::output::{display_option, print_keyed, print_single};

use super::task::{finish_task, WaitArgs};
use super::CommandContext;

/// Depot commands.
#[derive(Debug, Args)]
pub struct DepotCommand {
    #[command(subcommand)]
    command: DepotSubcommand,
}

#[derive(Debug, Subcommand)]
enum DepotSubcommand {
    /// Manage offline depots.
    #[command(subcommand)]
    Offline(OfflineSubcommand),

    /// List components available across all depots.
    Components(ComponentsArgs),
}

#[derive(Debug, Subcommand)]
enum OfflineSubcommand {
    /// List offline depots.
    Ls,

    /// Show one offline depot.
    Info(DepotIdArgs),

    /// Create an offline depot (asynchronous task).
    Create(CreateDepotArgs),

    /// Delete an offline depot (asynchronous task).
    Rm(RemoveDepotArgs),

    /// Show the metadata bundles of an offline depot.
    Content(DepotIdArgs),
}

#[derive(Debug, Args)]
struct DepotIdArgs {
    /// The identifier of the depot.
    #[arg(long)]
    depot_id: String,
}

#[derive(Debug, Args)]
struct CreateDepotArgs {
    /// Where the content comes from: PULL (from --location) or PUSH (from --file-id).
    #[arg(long, default_value = "PULL")]
    source_type: SourceType,

    /// URL of the depot index or zip bundle (PULL).
    #[arg(long)]
    location: Option<String>,

    /// Identifier of an uploaded file (PUSH).
    #[arg(long)]
    file_id: Option<String>,

    /// Free-form description.
    #[arg(long)]
    description: Option<String>,

    /// Opaque data stored with the depot for its owner.
    #[arg(long)]
    owner_data: Option<String>,

    #[command(flatten)]
    wait: WaitArgs,
}

#[derive(Debug, Args)]
struct RemoveDepotArgs {
    /// The identifier of the depot.
    #[arg(long)]
    depot_id: String,

    #[command(flatten)]
    wait: WaitArgs,
}

#[derive(Debug, Args)]
struct ComponentsArgs {
    /// Comma-separated component names to filter by.
    #[arg(long, value_delimiter = ',')]
    names: Vec<String>,

    /// Comma-separated vendors to filter by.
    #[arg(long, value_delimiter = ',')]
    vendors: Vec<String>,

    /// Comma-separated versions to filter by.
    #[arg(long, value_delimiter = ',')]
    versions: Vec<String>,

    /// Comma-separated bundle types to filter by.
    #[arg(long, value_delimiter = ',')]
    bundle_types: Vec<String>,

    /// Only components at or above this version.
    #[arg(long)]
    min_version: Option<String>,
}

impl From<ComponentsArgs> for DepotComponentFilter {
    fn from(args: ComponentsArgs) -> Self {
        Self {
            names: args.names,
            vendors: args.vendors,
            versions: args.versions,
            bundle_types: args.bundle_types,
            min_version: args.min_version,
        }
    }
}

impl DepotCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            DepotSubcommand::Offline(OfflineSubcommand::Ls) => list_depots(ctx).await,
            DepotSubcommand::Offline(OfflineSubcommand::Info(args)) => get_depot(ctx, args).await,
            DepotSubcommand::Offline(OfflineSubcommand::Create(args)) => {
                create_depot(ctx, args).await
            }
            DepotSubcommand::Offline(OfflineSubcommand::Rm(args)) => remove_depot(ctx, args).await,
            DepotSubcommand::Offline(OfflineSubcommand::Content(args)) => {
                depot_content(ctx, args).await
            }
            DepotSubcommand::Components(args) => list_components(ctx, args).await,
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct DepotRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Source")]
    source_type: String,
    #[tabled(rename = "Location / File")]
    source: String,
    #[tabled(rename = "Owner", display = "display_option")]
    owner: Option<String>,
    #[tabled(rename = "Created")]
    create_time: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl DepotRow {
    fn new(id: &str, depot: &OfflineDepotInfo) -> Self {
        Self {
            id: id.to_string(),
            source_type: depot.source_type.to_string(),
            source: depot
                .location
                .clone()
                .or_else(|| depot.file_id.clone())
                .unwrap_or_else(|| "-".to_string()),
            owner: depot.owner.clone(),
            create_time: depot.create_time.clone(),
            description: depot.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct DepotComponentRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Versions")]
    versions: String,
}

impl DepotComponentRow {
    fn new(name: &str, component: &DepotContentComponent) -> Self {
        Self {
            name: name.to_string(),
            display_name: component.display_name.clone(),
            vendor: component.vendor.clone(),
            versions: component
                .versions
                .iter()
                .map(|v| v.display_version.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Build the create spec, checking that the source flag matches the type.
fn create_spec(args: &CreateDepotArgs) -> Result<OfflineDepotCreateSpec> {
    match args.source_type {
        SourceType::Pull if args.location.is_none() => {
            anyhow::bail!("--location is required for PULL depots")
        }
        SourceType::Push if args.file_id.is_none() => {
            anyhow::bail!("--file-id is required for PUSH depots")
        }
        _ => {}
    }

    Ok(OfflineDepotCreateSpec {
        description: args.description.clone(),
        source_type: args.source_type,
        file_id: args.file_id.clone(),
        location: args.location.clone(),
        owner_data: args.owner_data.clone(),
    })
}

async fn list_depots(ctx: CommandContext) -> Result<()> {
    let depots = Manager::new(ctx.client()?).list_offline_depots().await?;

    print_keyed(&depots, ctx.format, DepotRow::new);
    Ok(())
}

async fn get_depot(ctx: CommandContext, args: DepotIdArgs) -> Result<()> {
    let depot = Manager::new(ctx.client()?)
        .get_offline_depot(&args.depot_id)
        .await
        .map_err(CliError::not_found_as(|| {
            format!("depot '{}'", args.depot_id)
        }))?;

    print_single(&depot, ctx.format);
    Ok(())
}

async fn create_depot(ctx: CommandContext, args: CreateDepotArgs) -> Result<()> {
    let spec = create_spec(&args)?;
    let client = ctx.client()?;

    let task_id = Manager::new(client.clone())
        .create_offline_depot(&spec)
        .await?;

    finish_task(
        &ctx,
        client,
        task_id,
        &args.wait,
        "depot.offline.create",
        "Started offline depot creation",
        serde_json::json!({}),
    )
    .await
}

async fn remove_depot(ctx: CommandContext, args: RemoveDepotArgs) -> Result<()> {
    let client = ctx.client()?;

    let task_id = Manager::new(client.clone())
        .delete_offline_depot(&args.depot_id)
        .await?;

    finish_task(
        &ctx,
        client,
        task_id,
        &args.wait,
        "depot.offline.delete",
        &format!("Started deletion of depot {}", args.depot_id),
        serde_json::json!({ "depot_id": args.depot_id }),
    )
    .await
}

async fn depot_content(ctx: CommandContext, args: DepotIdArgs) -> Result<()> {
    let content = Manager::new(ctx.client()?)
        .get_offline_depot_content(&args.depot_id)
        .await
        .map_err(CliError::not_found_as(|| {
            format!("depot '{}'", args.depot_id)
        }))?;

    print_single(&content, ctx.format);
    Ok(())
}

async fn list_components(ctx: CommandContext, args: ComponentsArgs) -> Result<()> {
    let filter = DepotComponentFilter::from(args);
    let components = Manager::new(ctx.client()?)
        .list_depot_components(&filter)
        .await?;

    let keyed: BTreeMap<String, DepotContentComponent> = components
        .into_iter()
        .map(|component| (component.name.clone(), component))
        .collect();

    print_keyed(&keyed, ctx.format, DepotComponentRow::new);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    use crate::commands::{Cli, Commands};

    fn parse_depot(args: &[&str]) -> DepotSubcommand {
        let mut argv = vec!["vlcmctl", "depot"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Depot(cmd) => cmd.command,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn components_filters_split_on_commas() {
        let DepotSubcommand::Components(args) = parse_depot(&["components", "--vendors", "VMware,Dell"])
        else {
            panic!("expected components");
        };

        let filter = DepotComponentFilter::from(args);
        assert_eq!(filter.vendors, vec!["VMware", "Dell"]);
        assert!(filter.names.is_empty());
        assert!(filter.versions.is_empty());
        assert!(filter.bundle_types.is_empty());
        assert!(filter.min_version.is_none());
    }

    #[test]
    fn create_requires_location_for_pull() {
        let DepotSubcommand::Offline(OfflineSubcommand::Create(args)) =
            parse_depot(&["offline", "create", "--source-type", "pull"])
        else {
            panic!("expected create");
        };

        let err = create_spec(&args).unwrap_err();
        assert!(err.to_string().contains("--location"));
    }

    #[test]
    fn create_push_builds_spec_with_file_id() {
        let DepotSubcommand::Offline(OfflineSubcommand::Create(args)) = parse_depot(&[
            "offline",
            "create",
            "--source-type",
            "PUSH",
            "--file-id",
            "file-17",
            "--wait",
            "--timeout",
            "600",
        ]) else {
            panic!("expected create");
        };

        assert!(args.wait.wait);
        assert_eq!(args.wait.timeout, Some(600));

        let spec = create_spec(&args).unwrap();
        assert_eq!(spec.source_type, SourceType::Push);
        assert_eq!(spec.file_id.as_deref(), Some("file-17"));
        assert!(spec.location.is_none());
    }

    #[test]
    fn rm_requires_depot_id() {
        assert!(Cli::try_parse_from(["vlcmctl", "depot", "offline", "rm"]).is_err());
    }

    #[test]
    fn depot_row_prefers_location() {
        let depot = OfflineDepotInfo {
            create_time: "2024-05-01T10:00:00Z".to_string(),
            description: "vendor bundle".to_string(),
            source_type: SourceType::Pull,
            location: Some("https://depot.example.com/index.xml".to_string()),
            ..Default::default()
        };

        let row = DepotRow::new("depot-1", &depot);
        assert_eq!(row.source, "https://depot.example.com/index.xml");
        assert_eq!(row.source_type, "PULL");
    }
}
