use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dune::{DuneClient, DuneError};
use crate::models::ChartRow;
use crate::poller::{poll_execution, PollOutcome};
use crate::transform::pivot_rows;

/// What the dashboard currently shows. A finished run replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DashboardView {
    #[default]
    Loading,
    Failed(String),
    Ready(Vec<ChartRow>),
}

/// Execute, poll, fetch and pivot. `Ok(None)` means the token fired on the way.
pub async fn load_chart_rows(
    client: &DuneClient,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<Option<Vec<ChartRow>>, DuneError> {
    let handle = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(None),
        handle = client.execute_query() => handle?,
    };
    tracing::info!(execution_id = %handle, "query execution started");

    match poll_execution(client, &handle, poll_interval, cancel).await? {
        PollOutcome::Finished(raw) => {
            let rows = pivot_rows(&raw);
            tracing::info!(raw = raw.len(), months = rows.len(), "chart data ready");
            Ok(Some(rows))
        }
        PollOutcome::Cancelled | PollOutcome::NoExecution => Ok(None),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    view: Arc<RwLock<DashboardView>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(view: DashboardView) -> Self {
        Self {
            view: Arc::new(RwLock::new(view)),
        }
    }

    pub async fn view(&self) -> DashboardView {
        self.view.read().await.clone()
    }

    /// Runs the whole pipeline once and publishes the result, unless `cancel` fired first.
    pub async fn run(&self, client: DuneClient, poll_interval: Duration, cancel: CancellationToken) {
        if !self.publish(DashboardView::Loading, &cancel).await {
            return;
        }

        let next = match load_chart_rows(&client, poll_interval, &cancel).await {
            Ok(Some(rows)) => DashboardView::Ready(rows),
            Ok(None) => {
                tracing::debug!("dashboard torn down before the query completed");
                return;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to load chart data");
                DashboardView::Failed(err.to_string())
            }
        };
        self.publish(next, &cancel).await;
    }

    /// Starts the single run that backs this dashboard.
    pub fn spawn(
        &self,
        client: DuneClient,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let dashboard = self.clone();
        tokio::spawn(async move { dashboard.run(client, poll_interval, cancel).await })
    }

    async fn publish(&self, next: DashboardView, cancel: &CancellationToken) -> bool {
        let mut view = self.view.write().await;
        if cancel.is_cancelled() {
            return false;
        }
        *view = next;
        true
    }
}
