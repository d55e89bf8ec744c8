mod cli;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use dune_gas_chart::api::{self, AppState};
use dune_gas_chart::chart::{self, Rendered};
use dune_gas_chart::config::Config;
use dune_gas_chart::dashboard::{load_chart_rows, Dashboard, DashboardView};
use dune_gas_chart::dune::DuneClient;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let client = DuneClient::new(config.api_key.clone(), &config.api_base_url)?;

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    match cli.command {
        Commands::Render { output } => {
            let output = output.unwrap_or_else(|| config.chart_output.clone());
            let dashboard = Dashboard::new();
            dashboard
                .run(client, config.poll_interval, shutdown.clone())
                .await;
            if shutdown.is_cancelled() {
                tracing::warn!("interrupted before the chart was ready");
                return Ok(());
            }

            let view = dashboard.view().await;
            match chart::render_view(&view)? {
                Rendered::Chart(svg) => {
                    tokio::fs::write(&output, svg)
                        .await
                        .with_context(|| format!("failed writing chart to {:?}", output))?;
                    tracing::info!("chart written to {}", output.display());
                }
                Rendered::Placeholder(text) => {
                    if let DashboardView::Failed(_) = view {
                        anyhow::bail!(text);
                    }
                    println!("{}", text);
                }
            }
        }
        Commands::Rows => {
            if let Some(rows) = load_chart_rows(&client, config.poll_interval, &shutdown).await? {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            }
        }
        Commands::Serve { addr } => {
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            let dashboard = Dashboard::new();
            let loader = dashboard.spawn(client, config.poll_interval, shutdown.clone());

            let served = api::run_http_server(&bind, AppState { dashboard }, shutdown.clone()).await;
            shutdown.cancel();
            if let Err(err) = loader.await {
                tracing::warn!("dashboard loader ended abnormally: {}", err);
            }
            served?;
        }
    }

    Ok(())
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            token.cancel();
        }
    });
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
