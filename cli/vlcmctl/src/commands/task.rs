//! Task commands and the shared wait helper for asynchronous operations.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use vlcm_vapi::tasks::Manager;
use vlcm_vapi::Client;

use crate::error::CliError;
use crate::output::{print_receipt, print_single, Receipt, ReceiptNextStep};

use super::CommandContext;

/// Task commands.
#[derive(Debug, Args)]
pub struct TaskCommand {
    #[command(subcommand)]
    command: TaskSubcommand,
}

#[derive(Debug, Subcommand)]
enum TaskSubcommand {
    /// Show the status document of a task.
    Info(TaskIdArgs),

    /// Wait until a task leaves the RUNNING state.
    Wait(TaskWaitArgs),
}

#[derive(Debug, Args)]
struct TaskIdArgs {
    /// The identifier of the task.
    #[arg(long)]
    task_id: String,
}

#[derive(Debug, Args)]
struct TaskWaitArgs {
    /// The identifier of the task.
    #[arg(long)]
    task_id: String,

    /// Stop waiting after this many seconds (the task keeps running).
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

/// `--wait` / `--timeout` flags shared by asynchronous commands.
#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Wait for the started task to finish.
    #[arg(long)]
    pub wait: bool,

    /// Stop waiting after this many seconds (the task keeps running).
    #[arg(long, value_name = "SECS", requires = "wait")]
    pub timeout: Option<u64>,
}

impl TaskCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            TaskSubcommand::Info(args) => task_info(ctx, args).await,
            TaskSubcommand::Wait(args) => task_wait(ctx, args).await,
        }
    }
}

/// Poll a task until it finishes, Ctrl-C is pressed or `timeout` expires.
///
/// Returns the terminal status as reported by the server.
pub async fn wait_for_task(client: Client, task_id: &str, timeout: Option<u64>) -> Result<String> {
    tracing::debug!(task_id, timeout_secs = ?timeout, "waiting for task");
    let status = Manager::new(client)
        .wait_for_completion_until(task_id, stop_signal(timeout))
        .await?;
    Ok(status)
}

/// Print the receipt of an asynchronous operation, waiting first if asked.
pub async fn finish_task(
    ctx: &CommandContext,
    client: Client,
    task_id: String,
    wait: &WaitArgs,
    kind: &str,
    started: &str,
    mut ids: serde_json::Value,
) -> Result<()> {
    ids["task_id"] = serde_json::json!(task_id);

    if wait.wait {
        let status = wait_for_task(client, &task_id, wait.timeout).await?;
        let next: Vec<ReceiptNextStep> = Vec::new();
        print_receipt(
            ctx.format,
            Receipt {
                message: format!("{} (task {} {})", started, task_id, status),
                status: &status,
                kind,
                ids,
                next: &next,
            },
        );
        return Ok(());
    }

    let next = vec![ReceiptNextStep {
        label: "Wait",
        cmd: format!("vlcmctl task wait --task-id {}", task_id),
    }];
    print_receipt(
        ctx.format,
        Receipt {
            message: format!("{} (task {})", started, task_id),
            status: "accepted",
            kind,
            ids,
            next: &next,
        },
    );
    Ok(())
}

fn stop_signal(timeout: Option<u64>) -> impl Future<Output = ()> {
    async move {
        let deadline = async {
            match timeout {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = deadline => {}
        }
    }
}

async fn task_info(ctx: CommandContext, args: TaskIdArgs) -> Result<()> {
    let info = Manager::new(ctx.client()?)
        .get_task_info(&args.task_id)
        .await
        .map_err(CliError::not_found_as(|| {
            format!("task '{}'", args.task_id)
        }))?;

    print_single(&info, ctx.format);
    Ok(())
}

async fn task_wait(ctx: CommandContext, args: TaskWaitArgs) -> Result<()> {
    let status = wait_for_task(ctx.client()?, &args.task_id, args.timeout).await?;

    print_receipt(
        ctx.format,
        Receipt {
            message: format!("Task {} finished with status {}", args.task_id, status),
            status: &status,
            kind: "task.wait",
            ids: serde_json::json!({ "task_id": args.task_id }),
            next: &[],
        },
    );
    Ok(())
}
