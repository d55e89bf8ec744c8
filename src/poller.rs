use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::dune::{DuneClient, DuneError};
use crate::models::{ExecutionHandle, ExecutionStatus, RawRow};

/// Where an execution stands after one status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Running,
    Finished,
    Failed,
}

impl PollStep {
    /// Finished wins over the failure sentinel; anything else keeps running.
    pub fn from_status(status: &ExecutionStatus) -> Self {
        if status.is_execution_finished {
            PollStep::Finished
        } else if status.is_failed() {
            PollStep::Failed
        } else {
            PollStep::Running
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Finished(Vec<RawRow>),
    /// The token fired; the caller must not touch any state.
    Cancelled,
    /// Blank handle, nothing was polled.
    NoExecution,
}

/// Checks `handle` every `interval` until it finishes or fails, then fetches its rows.
///
/// Checks are strictly sequential. The token is consulted before every request and while
/// waiting, so nothing is sent once it is cancelled.
pub async fn poll_execution(
    client: &DuneClient,
    handle: &ExecutionHandle,
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<PollOutcome, DuneError> {
    if handle.is_empty() {
        tracing::debug!("no execution handle, skipping status polling");
        return Ok(PollOutcome::NoExecution);
    }

    loop {
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            status = client.execution_status(handle) => status?,
        };

        match PollStep::from_status(&status) {
            PollStep::Finished => {
                tracing::info!(execution_id = %handle, "execution finished, fetching results");
                let rows = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                    rows = client.execution_results(handle) => rows?,
                };
                return Ok(PollOutcome::Finished(rows));
            }
            PollStep::Failed => {
                tracing::warn!(execution_id = %handle, "execution reported FAILED");
                return Err(DuneError::ExecutionFailed);
            }
            PollStep::Running => {
                tracing::info!(
                    execution_id = %handle,
                    state = %status.state,
                    "query still running, checking again in {:?}",
                    interval
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        }
    }
}
