//! Task status lookup and completion polling.
//!
//! Asynchronous vAPI calls (`vmw-task=true`) answer with a task id. The
//! poller re-reads `/api/cis/tasks/{id}` on a fixed interval until the task
//! leaves `RUNNING`.
//!
//! # Invariants
//!
//! - The first status fetch happens one full interval after the wait starts.
//! - Ticks follow a fixed schedule from the start; they are not adaptive.
//! - Only equality with `RUNNING` is tested; every other status is returned
//!   verbatim, including `FAILED` and `BLOCKED`.
//! - A failed fetch ends the wait immediately, it is never retried here.
//! - Polling reads only `status`; the rest of the document is ignored.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::Error;
use crate::rest::{Client, LocalizableMessage};

/// Endpoint for retrieving tasks.
pub const TASKS_PATH: &str = "/api/cis/tasks";

/// The only non-terminal task status.
pub const RUNNING: &str = "RUNNING";

/// Time between two status fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shortest accepted poll interval; smaller values are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The one field the poller reads from a status document.
///
/// Unknown or oddly shaped fields next to `status` are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatus {
    pub status: String,
}

/// Task status document.
///
/// `status` is mandatory: a document without it, or with a non-string value,
/// fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizableMessage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<TaskProgress>,

    /// Error payload of a failed task; its shape depends on the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,

    /// Result payload of a finished task; its shape depends on the operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub completed: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<LocalizableMessage>,
}

/// Why a wait ended without a terminal status.
#[derive(Debug, Error)]
pub enum WaitError {
    /// Fetching or decoding the status failed.
    #[error("failed to fetch status of task {task_id}: {source}")]
    Fetch {
        task_id: String,
        last_status: Option<String>,
        #[source]
        source: Error,
    },

    /// The caller's stop signal fired first.
    #[error("stopped waiting for task {task_id}")]
    Cancelled {
        task_id: String,
        last_status: Option<String>,
    },
}

impl WaitError {
    /// Status seen by the last successful fetch, if any.
    pub fn last_status(&self) -> Option<&str> {
        match self {
            WaitError::Fetch { last_status, .. } | WaitError::Cancelled { last_status, .. } => {
                last_status.as_deref()
            }
        }
    }
}

/// Anything able to report the current status of a task.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn fetch_status(&self, task_id: &str) -> Result<String, Error>;
}

/// Poll `source` every `period` until the task leaves [`RUNNING`].
///
/// Returns the terminal status string. `stop` is raced against every tick and
/// every fetch; when it resolves the wait ends with [`WaitError::Cancelled`].
/// Pass [`std::future::pending`] to wait indefinitely.
///
/// A `period` below [`MIN_POLL_INTERVAL`] is raised to it.
pub async fn poll_until_terminal<S, F>(
    source: &S,
    task_id: &str,
    period: Duration,
    stop: F,
) -> Result<String, WaitError>
where
    S: TaskStatusSource + ?Sized,
    F: Future<Output = ()>,
{
    let period = period.max(MIN_POLL_INTERVAL);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(stop);

    let mut last_status: Option<String> = None;
    let mut attempt = 0u64;

    loop {
        let next = async {
            ticker.tick().await;
            source.fetch_status(task_id).await
        };

        tokio::select! {
            biased;
            _ = &mut stop => {
                info!(task_id, attempt, "Stopped waiting for task");
                return Err(WaitError::Cancelled {
                    task_id: task_id.to_string(),
                    last_status,
                });
            }
            outcome = next => {
                attempt += 1;
                let status = outcome.map_err(|source| WaitError::Fetch {
                    task_id: task_id.to_string(),
                    last_status: last_status.clone(),
                    source,
                })?;

                debug!(task_id, attempt, %status, "Polled task status");

                if status != RUNNING {
                    info!(task_id, attempt, %status, "Task finished");
                    return Ok(status);
                }
                last_status = Some(status);
            }
        }
    }
}

/// Task manager over the REST client.
#[derive(Debug, Clone)]
pub struct Manager {
    client: Client,
    poll_interval: Duration,
}

impl Manager {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the time between two status fetches.
    ///
    /// Values below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Fetch the status document of a task.
    pub async fn get_task_info(&self, task_id: &str) -> Result<TaskInfo, Error> {
        let value = self.fetch_document(task_id).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch only the status of a task.
    pub async fn get_task_status(&self, task_id: &str) -> Result<String, Error> {
        let value = self.fetch_document(task_id).await?;
        let task: TaskStatus = serde_json::from_value(value)?;
        Ok(task.status)
    }

    async fn fetch_document(&self, task_id: &str) -> Result<serde_json::Value, Error> {
        let request = self
            .client
            .resource(TASKS_PATH)?
            .with_subpath(task_id)
            .request(Method::GET);

        // Decode through a Value so an empty body is a decode failure.
        self.client.execute(request).await
    }

    /// Block until the task leaves `RUNNING`, without any time limit.
    pub async fn wait_for_completion(&self, task_id: &str) -> Result<String, WaitError> {
        self.wait_for_completion_until(task_id, std::future::pending::<()>())
            .await
    }

    /// Block until the task leaves `RUNNING` or `stop` resolves.
    pub async fn wait_for_completion_until<F>(
        &self,
        task_id: &str,
        stop: F,
    ) -> Result<String, WaitError>
    where
        F: Future<Output = ()>,
    {
        poll_until_terminal(self, task_id, self.poll_interval, stop).await
    }
}

#[async_trait]
impl TaskStatusSource for Manager {
    async fn fetch_status(&self, task_id: &str) -> Result<String, Error> {
        self.get_task_status(task_id).await
    }
}
