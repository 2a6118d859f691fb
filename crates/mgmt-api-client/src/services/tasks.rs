// ============================================
// File: crates/mgmt-api-client/src/services/tasks.rs
// ============================================
//! # Task Resolver
//!
//! ## Creation Reason
//! Commands such as `publish` or `install-policy` answer with a task id
//! instead of a result. This service turns that into a single call by
//! polling `show-task` until every task and sub-task has finished.
//!
//! ## Main Functionality
//! - `ResolveOptions`: poll interval, optional deadline, optional cancellation
//! - `TaskResolver::resolve`: single or multiple task ids
//!
//! ## Resolution Flow
//! ```text
//!   ┌─────────┐  show-task   ┌──────────────┐  none in progress  ┌──────────┐
//!   │ Pending │────────────►│ any running? │───────────────────►│ Resolved │
//!   └─────────┘              └──────┬───────┘                    └────┬─────┘
//!        ▲                          │ yes                             │
//!        └──── sleep(interval) ◄────┘               failed / partially succeeded
//!              (or cancel / deadline)                → success = false
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The final reply keeps the last `show-task` status code; only the
//!   success flag is overridden when a task failed
//! - Multiple tasks are waited for one after another, then fetched again
//!   in one combined `show-task`
//! - A failed status check aborts the whole resolution; nothing is resumed
//!
//! ## Last Modified
//! v0.1.0 - Initial task resolver

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mgmt_api_core::protocol::task::{any_failed, any_in_progress, show_task_payload};
use mgmt_api_core::protocol::{ApiResponse, TaskTrigger, SHOW_TASK_COMMAND};

use crate::client::ApiClient;
use crate::error::{ClientError, Result};
use crate::session::Session;

/// Default wait between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ============================================
// ResolveOptions
// ============================================

/// How a task is waited for.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Wait between two status checks.
    pub poll_interval: Duration,
    /// Give up once this much time has passed since the first check.
    pub deadline: Option<Duration>,
    /// Stop waiting when this token is cancelled.
    pub cancel: Option<CancellationToken>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
            cancel: None,
        }
    }
}

impl ResolveOptions {
    /// Sets the deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

// ============================================
// TaskResolver
// ============================================

/// Polls `show-task` on one session until tasks finish.
pub struct TaskResolver<'a> {
    client: &'a ApiClient,
    session: &'a Session,
    options: &'a ResolveOptions,
}

impl<'a> TaskResolver<'a> {
    /// Creates a resolver for `session`.
    #[must_use]
    pub const fn new(client: &'a ApiClient, session: &'a Session, options: &'a ResolveOptions) -> Self {
        Self {
            client,
            session,
            options,
        }
    }

    /// Waits for the tasks named by `trigger` and returns the final
    /// `show-task` reply.
    ///
    /// # Errors
    /// - `TaskResolution` if a status check fails or cannot be read
    /// - `Cancelled` / `DeadlineExceeded` while waiting
    pub async fn resolve(&self, trigger: &TaskTrigger) -> Result<ApiResponse> {
        match trigger {
            TaskTrigger::Single(task_id) => self.resolve_one(task_id).await,
            TaskTrigger::Multiple(task_ids) => self.resolve_all(task_ids).await,
        }
    }

    async fn resolve_one(&self, task_id: &str) -> Result<ApiResponse> {
        let started = Instant::now();
        let deadline = self.options.deadline.map(|d| started + d);
        let ids = [task_id.to_owned()];

        loop {
            let response = self.poll(task_id, &ids).await?;
            let running = any_in_progress(response.payload())
                .map_err(|e| ClientError::task_resolution(task_id, e))?;
            if !running {
                debug!(task_id, elapsed = ?started.elapsed(), "Task finished");
                return finish(task_id, response);
            }
            debug!(task_id, "Task in progress");
            self.wait(task_id, started, deadline).await?;
        }
    }

    async fn resolve_all(&self, task_ids: &[String]) -> Result<ApiResponse> {
        let label = task_ids.join(",");
        info!(tasks = %label, "Waiting for {} tasks", task_ids.len());

        for task_id in task_ids {
            self.resolve_one(task_id).await?;
        }

        let combined = self.poll(&label, task_ids).await?;
        finish(&label, combined)
    }

    async fn poll(&self, label: &str, task_ids: &[String]) -> Result<ApiResponse> {
        let response = self
            .client
            .session_call(self.session, SHOW_TASK_COMMAND, show_task_payload(task_ids))
            .await
            .map_err(|e| ClientError::task_poll_failed(label, e))?;

        if !response.is_success() {
            return Err(ClientError::task_resolution(
                label,
                format!(
                    "show-task returned status {}: {}",
                    response.status_code(),
                    response.error_message().unwrap_or("no message")
                ),
            ));
        }
        Ok(response)
    }

    async fn wait(&self, task_id: &str, started: Instant, deadline: Option<Instant>) -> Result<()> {
        let cancelled = async {
            match &self.options.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => {
                info!(task_id, "Stopped waiting for task: cancelled");
                Err(ClientError::Cancelled { task_id: task_id.to_owned() })
            }
            () = expired => {
                warn!(task_id, "Stopped waiting for task: deadline reached");
                Err(ClientError::DeadlineExceeded {
                    task_id: task_id.to_owned(),
                    waited: started.elapsed(),
                })
            }
            () = tokio::time::sleep(self.options.poll_interval) => Ok(()),
        }
    }
}

/// Marks the reply unsuccessful if any task failed.
fn finish(label: &str, mut response: ApiResponse) -> Result<ApiResponse> {
    let failed =
        any_failed(response.payload()).map_err(|e| ClientError::task_resolution(label, e))?;
    if failed {
        warn!(tasks = label, "Task finished with failures");
        response.set_success(false);
    }
    Ok(response)
}

// ============================================
// Tests
// ============================================
