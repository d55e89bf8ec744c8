use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::chart::{render_page, render_view, Rendered};
use crate::dashboard::{Dashboard, DashboardView};

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn index(State(state): State<AppState>) -> Response {
    match render_page(&state.dashboard.view().await) {
        Ok(page) => Html(page).into_response(),
        Err(err) => render_error(err),
    }
}

async fn chart_svg(State(state): State<AppState>) -> Response {
    match render_view(&state.dashboard.view().await) {
        Ok(Rendered::Chart(svg)) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Ok(Rendered::Placeholder(text)) => (StatusCode::NOT_FOUND, text).into_response(),
        Err(err) => render_error(err),
    }
}

async fn chart_rows(State(state): State<AppState>) -> Json<Value> {
    Json(match state.dashboard.view().await {
        DashboardView::Loading => json!({ "state": "loading" }),
        DashboardView::Failed(error) => json!({ "state": "failed", "error": error }),
        DashboardView::Ready(rows) => json!({ "state": "ready", "rows": rows }),
    })
}

fn render_error(err: anyhow::Error) -> Response {
    tracing::error!("failed to render chart: {:#}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "failed to render chart").into_response()
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/chart.svg", get(chart_svg))
        .route("/api/rows", get(chart_rows))
        .with_state(state)
}

/// Serves the dashboard until `shutdown` is cancelled.
pub async fn run_http_server(addr: &str, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
