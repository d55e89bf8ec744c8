use std::net::SocketAddr;

use reqwest::Client;
use tokio::task::JoinHandle;

use dune_gas_chart::api::{app_router, AppState};
use dune_gas_chart::dashboard::{Dashboard, DashboardView};
use dune_gas_chart::models::ChartRow;

#[tokio::test]
async fn health_endpoint_works() {
    let (base_url, handle) = spawn_app(DashboardView::Loading).await;
    let client = Client::new();
    let res = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body.get("status").and_then(|s| s.as_str()), Some("ok"));
    handle.abort();
}

#[tokio::test]
async fn loading_page_shows_placeholder() {
    let (base_url, handle) = spawn_app(DashboardView::Loading).await;
    let client = Client::new();

    let page = client.get(&base_url).send().await.unwrap();
    assert!(page.status().is_success());
    assert!(page.text().await.unwrap().contains("Loading data..."));

    let rows: serde_json::Value = client
        .get(format!("{}/api/rows", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rows, serde_json::json!({ "state": "loading" }));

    let svg = client
        .get(format!("{}/chart.svg", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(svg.status().as_u16(), 404);
    handle.abort();
}

#[tokio::test]
async fn failed_view_reports_error() {
    let (base_url, handle) =
        spawn_app(DashboardView::Failed("Query execution failed".to_string())).await;
    let client = Client::new();

    let page = client.get(&base_url).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("Error: Query execution failed"));

    let rows: serde_json::Value = client
        .get(format!("{}/api/rows", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rows.get("state").and_then(|s| s.as_str()), Some("failed"));
    assert_eq!(
        rows.get("error").and_then(|s| s.as_str()),
        Some("Query execution failed")
    );
    handle.abort();
}

#[tokio::test]
async fn ready_view_serves_chart_and_rows() {
    let rows = vec![
        chart_row("2024-01-01", &[("ethereum", 1_500_000.0), ("solana", 250.0)]),
        chart_row("2024-02-01", &[("ethereum", 900.0), ("solana", 0.0)]),
    ];
    let (base_url, handle) = spawn_app(DashboardView::Ready(rows)).await;
    let client = Client::new();

    let svg = client
        .get(format!("{}/chart.svg", base_url))
        .send()
        .await
        .unwrap();
    assert!(svg.status().is_success());
    assert_eq!(
        svg.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("image/svg+xml")
    );
    let svg = svg.text().await.unwrap();
    assert!(svg.contains("<title>Jan 24 / ethereum: 1,500,000</title>"));

    let page = client.get(&base_url).send().await.unwrap().text().await.unwrap();
    assert!(page.contains("Blockchain Gas Fees"));
    assert!(page.contains("<svg"));

    let body: serde_json::Value = client
        .get(format!("{}/api/rows", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.get("state").and_then(|s| s.as_str()), Some("ready"));
    let arr = body
        .get("rows")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    assert_eq!(arr.len(), 2);
    assert_eq!(
        arr[1],
        serde_json::json!({ "month": "2024-02-01", "ethereum": 900.0, "solana": 0.0 })
    );
    handle.abort();
}

#[tokio::test]
async fn empty_ready_view_is_not_an_error() {
    let (base_url, handle) = spawn_app(DashboardView::Ready(Vec::new())).await;
    let client = Client::new();

    let page = client.get(&base_url).send().await.unwrap();
    assert!(page.status().is_success());
    let page = page.text().await.unwrap();
    assert!(page.contains("No data available"));
    assert!(!page.contains("Error:"));
    handle.abort();
}

fn chart_row(month: &str, values: &[(&str, f64)]) -> ChartRow {
    ChartRow {
        month: month.to_string(),
        values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
    }
}

async fn spawn_app(view: DashboardView) -> (String, JoinHandle<()>) {
    let state = AppState {
        dashboard: Dashboard::with_view(view),
    };
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app);
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });

    (base_url, handle)
}
