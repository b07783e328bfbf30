//! Cluster software draft commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use tabled::Tabled;
use vlcm_vapi::clusters::{CommitSpec, ComponentInfo, ComponentsUpdateSpec, DraftMetadata, Manager};

use crate::error::CliError;
use crate::output::{print_keyed, print_receipt, print_single, Receipt, ReceiptNextStep};

use super::task::{finish_task, WaitArgs};
use super::CommandContext;

/// Cluster commands.
#[derive(Debug, Args)]
pub struct ClusterCommand {
    #[command(subcommand)]
    command: ClusterSubcommand,
}

#[derive(Debug, Subcommand)]
enum ClusterSubcommand {
    /// Manage software drafts of a cluster.
    #[command(subcommand)]
    Draft(DraftSubcommand),
}

#[derive(Debug, Subcommand)]
enum DraftSubcommand {
    /// List software drafts.
    Ls(ListDraftsArgs),

    /// Show a software draft.
    Info(DraftArgs),

    /// Create a software draft.
    Create(ClusterArgs),

    /// Discard a software draft.
    Rm(DraftArgs),

    /// Commit a software draft (asynchronous task).
    Commit(CommitArgs),

    /// Manage the components of a software draft.
    #[command(subcommand)]
    Component(ComponentSubcommand),
}

#[derive(Debug, Subcommand)]
enum ComponentSubcommand {
    /// List the components in a software draft.
    Ls(DraftArgs),

    /// Show a component in a software draft.
    Info(ComponentArgs),

    /// Add, change or delete components in a software draft.
    Set(SetComponentsArgs),

    /// Remove a component from a software draft.
    Rm(ComponentArgs),
}

#[derive(Debug, Args)]
struct ClusterArgs {
    /// The identifier of the cluster.
    #[arg(long)]
    cluster_id: String,
}

#[derive(Debug, Args)]
struct ListDraftsArgs {
    /// The identifier of the cluster.
    #[arg(long)]
    cluster_id: String,

    /// A comma-separated list of owners to filter by.
    #[arg(long, value_delimiter = ',')]
    owners: Vec<String>,
}

#[derive(Debug, Args)]
struct DraftArgs {
    /// The identifier of the cluster.
    #[arg(long)]
    cluster_id: String,

    /// The identifier of the software draft.
    #[arg(long)]
    draft_id: String,
}

#[derive(Debug, Args)]
struct ComponentArgs {
    #[command(flatten)]
    draft: DraftArgs,

    /// The identifier of the software component.
    #[arg(long)]
    component_id: String,
}

#[derive(Debug, Args)]
struct CommitArgs {
    #[command(flatten)]
    draft: DraftArgs,

    /// Message recorded with the commit.
    #[arg(long)]
    message: Option<String>,

    #[command(flatten)]
    wait: WaitArgs,
}

#[derive(Debug, Args)]
struct SetComponentsArgs {
    #[command(flatten)]
    draft: DraftArgs,

    /// Component to add or change; without a version the server picks one.
    #[arg(long = "component", value_name = "NAME[=VERSION]")]
    components: Vec<String>,

    /// Component to delete.
    #[arg(long = "delete", value_name = "NAME")]
    deletes: Vec<String>,
}

impl ClusterCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let ClusterSubcommand::Draft(command) = self.command;
        match command {
            DraftSubcommand::Ls(args) => list_drafts(ctx, args).await,
            DraftSubcommand::Info(args) => get_draft(ctx, args).await,
            DraftSubcommand::Create(args) => create_draft(ctx, args).await,
            DraftSubcommand::Rm(args) => delete_draft(ctx, args).await,
            DraftSubcommand::Commit(args) => commit_draft(ctx, args).await,
            DraftSubcommand::Component(ComponentSubcommand::Ls(args)) => {
                list_components(ctx, args).await
            }
            DraftSubcommand::Component(ComponentSubcommand::Info(args)) => {
                get_component(ctx, args).await
            }
            DraftSubcommand::Component(ComponentSubcommand::Set(args)) => {
                set_components(ctx, args).await
            }
            DraftSubcommand::Component(ComponentSubcommand::Rm(args)) => {
                remove_component(ctx, args).await
            }
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct DraftRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    creation_time: String,
}

impl DraftRow {
    fn new(id: &str, draft: &DraftMetadata) -> Self {
        Self {
            id: id.to_string(),
            owner: draft.owner.clone(),
            status: draft.status.clone(),
            creation_time: draft.creation_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Tabled)]
struct ComponentRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
}

impl ComponentRow {
    fn new(name: &str, component: &ComponentInfo) -> Self {
        Self {
            name: name.to_string(),
            display_name: component.details.display_name.clone(),
            version: component.version.clone(),
            vendor: component.details.vendor.clone(),
        }
    }
}

fn draft_not_found(args: &DraftArgs) -> impl FnOnce(vlcm_vapi::Error) -> CliError + '_ {
    CliError::not_found_as(move || {
        format!(
            "draft '{}' on cluster '{}'",
            args.draft_id, args.cluster_id
        )
    })
}

/// Parse `--component NAME[=VERSION]` and `--delete NAME` into an update spec.
fn update_spec(args: &SetComponentsArgs) -> Result<ComponentsUpdateSpec> {
    let mut spec = ComponentsUpdateSpec::default();

    for entry in &args.components {
        let (name, version) = match entry.split_once('=') {
            Some((name, version)) => (name.trim(), Some(version.trim().to_string())),
            None => (entry.trim(), None),
        };
        if name.is_empty() {
            anyhow::bail!("Invalid --component '{}': missing component name", entry);
        }
        let version = version.filter(|v| !v.is_empty());
        spec.components_to_set.insert(name.to_string(), version);
    }

    for name in &args.deletes {
        if spec.components_to_set.contains_key(name) {
            anyhow::bail!("Component '{}' is both set and deleted", name);
        }
        spec.components_to_delete.push(name.clone());
    }

    if spec.is_empty() {
        anyhow::bail!("Nothing to change. Use --component NAME[=VERSION] or --delete NAME.");
    }

    Ok(spec)
}

fn component_ls_cmd(draft: &DraftArgs) -> String {
    format!(
        "vlcmctl cluster draft component ls --cluster-id {} --draft-id {}",
        draft.cluster_id, draft.draft_id
    )
}

async fn list_drafts(ctx: CommandContext, args: ListDraftsArgs) -> Result<()> {
    let drafts = Manager::new(ctx.client()?)
        .list_software_drafts(&args.cluster_id, &args.owners)
        .await?;

    print_keyed(&drafts, ctx.format, DraftRow::new);
    Ok(())
}

async fn get_draft(ctx: CommandContext, args: DraftArgs) -> Result<()> {
    let draft = Manager::new(ctx.client()?)
        .get_software_draft(&args.cluster_id, &args.draft_id)
        .await
        .map_err(draft_not_found(&args))?;

    print_single(&draft, ctx.format);
    Ok(())
}

async fn create_draft(ctx: CommandContext, args: ClusterArgs) -> Result<()> {
    let draft_id = Manager::new(ctx.client()?)
        .create_software_draft(&args.cluster_id)
        .await?;

    let draft = DraftArgs {
        cluster_id: args.cluster_id.clone(),
        draft_id: draft_id.clone(),
    };
    let next = vec![ReceiptNextStep {
        label: "Next",
        cmd: component_ls_cmd(&draft),
    }];

    print_receipt(
        ctx.format,
        Receipt {
            message: format!(
                "Created software draft {} on cluster {}",
                draft_id, args.cluster_id
            ),
            status: "created",
            kind: "cluster.draft.create",
            ids: serde_json::json!({
                "cluster_id": args.cluster_id,
                "draft_id": draft_id
            }),
            next: &next,
        },
    );
    Ok(())
}

async fn delete_draft(ctx: CommandContext, args: DraftArgs) -> Result<()> {
    Manager::new(ctx.client()?)
        .delete_software_draft(&args.cluster_id, &args.draft_id)
        .await
        .map_err(draft_not_found(&args))?;

    let next = vec![ReceiptNextStep {
        label: "Next",
        cmd: format!("vlcmctl cluster draft ls --cluster-id {}", args.cluster_id),
    }];

    print_receipt(
        ctx.format,
        Receipt {
            message: format!("Deleted software draft {}", args.draft_id),
            status: "deleted",
            kind: "cluster.draft.delete",
            ids: serde_json::json!({
                "cluster_id": args.cluster_id,
                "draft_id": args.draft_id
            }),
            next: &next,
        },
    );
    Ok(())
}

async fn commit_draft(ctx: CommandContext, args: CommitArgs) -> Result<()> {
    let client = ctx.client()?;
    let spec = CommitSpec {
        message: args.message.clone(),
    };

    let task_id = Manager::new(client.clone())
        .commit_software_draft(&args.draft.cluster_id, &args.draft.draft_id, &spec)
        .await
        .map_err(draft_not_found(&args.draft))?;

    finish_task(
        &ctx,
        client,
        task_id,
        &args.wait,
        "cluster.draft.commit",
        &format!("Started commit of software draft {}", args.draft.draft_id),
        serde_json::json!({
            "cluster_id": args.draft.cluster_id,
            "draft_id": args.draft.draft_id
        }),
    )
    .await
}

async fn list_components(ctx: CommandContext, args: DraftArgs) -> Result<()> {
    let components = Manager::new(ctx.client()?)
        .list_software_draft_components(&args.cluster_id, &args.draft_id)
        .await
        .map_err(draft_not_found(&args))?;

    print_keyed(&components, ctx.format, ComponentRow::new);
    Ok(())
}

async fn get_component(ctx: CommandContext, args: ComponentArgs) -> Result<()> {
    let component = Manager::new(ctx.client()?)
        .get_software_draft_component(
            &args.draft.cluster_id,
            &args.draft.draft_id,
            &args.component_id,
        )
        .await
        .map_err(CliError::not_found_as(|| {
            format!(
                "component '{}' in draft '{}' on cluster '{}'",
                args.component_id, args.draft.draft_id, args.draft.cluster_id
            )
        }))?;

    print_single(&component, ctx.format);
    Ok(())
}

async fn set_components(ctx: CommandContext, args: SetComponentsArgs) -> Result<()> {
    let spec = update_spec(&args)?;

    Manager::new(ctx.client()?)
        .update_software_draft_components(&args.draft.cluster_id, &args.draft.draft_id, &spec)
        .await
        .map_err(draft_not_found(&args.draft))?;

    let next = vec![ReceiptNextStep {
        label: "Next",
        cmd: component_ls_cmd(&args.draft),
    }];

    print_receipt(
        ctx.format,
        Receipt {
            message: format!(
                "Updated software draft {} ({} set, {} deleted)",
                args.draft.draft_id,
                spec.components_to_set.len(),
                spec.components_to_delete.len()
            ),
            status: "updated",
            kind: "cluster.draft.component.set",
            ids: serde_json::json!({
                "cluster_id": args.draft.cluster_id,
                "draft_id": args.draft.draft_id
            }),
            next: &next,
        },
    );
    Ok(())
}

async fn remove_component(ctx: CommandContext, args: ComponentArgs) -> Result<()> {
    Manager::new(ctx.client()?)
        .remove_software_draft_component(
            &args.draft.cluster_id,
            &args.draft.draft_id,
            &args.component_id,
        )
        .await
        .map_err(CliError::not_found_as(|| {
            format!(
                "component '{}' in draft '{}' on cluster '{}'",
                args.component_id, args.draft.draft_id, args.draft.cluster_id
            )
        }))?;

    let next = vec![ReceiptNextStep {
        label: "Next",
        cmd: component_ls_cmd(&args.draft),
    }];

    print_receipt(
        ctx.format,
        Receipt {
            message: format!(
                "Removed component {} from software draft {}",
                args.component_id, args.draft.draft_id
            ),
            status: "deleted",
            kind: "cluster.draft.component.rm",
            ids: serde_json::json!({
                "cluster_id": args.draft.cluster_id,
                "draft_id": args.draft.draft_id,
                "component_id": args.component_id
            }),
            next: &next,
        },
    );
    Ok(())
}
