use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::models::{
    ExecuteResponse, ExecutionHandle, ExecutionStatus, RawRow, ResultsResponse,
};

/// Dune query with monthly gas fees per blockchain.
pub const QUERY_ID: u64 = 4660392;

const API_KEY_HEADER: &str = "x-dune-api-key";

/// Failures of the execute / poll / fetch flow. `Display` is the message shown to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DuneError {
    /// Execute request rejected by the API or never delivered.
    #[error("{0}")]
    Trigger(String),
    /// Status or results request failed in transport or returned an unreadable body.
    #[error("{0}")]
    StatusCheck(String),
    /// The API reported the execution as failed.
    #[error("Query execution failed")]
    ExecutionFailed,
}

#[derive(Clone)]
pub struct DuneClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl DuneClient {
    pub fn new(api_key: impl Into<String>, base_url: &Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self::with_http_client(api_key, base_url, http))
    }

    pub fn with_http_client(api_key: impl Into<String>, base_url: &Url, http: Client) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Starts one run of [`QUERY_ID`] with an empty parameter set.
    pub async fn execute_query(&self) -> Result<ExecutionHandle, DuneError> {
        let url = format!("{}/query/{}/execute", self.base_url, QUERY_ID);
        tracing::info!(query_id = QUERY_ID, "initiating query execution");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "parameters": {} }))
            .send()
            .await
            .map_err(|e| DuneError::Trigger(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DuneError::Trigger(e.to_string()))?;
        tracing::debug!(%status, body = %body, "execute response");

        let parsed = serde_json::from_str::<ExecuteResponse>(&body);
        if !status.is_success() {
            let reason = parsed
                .ok()
                .and_then(|r| r.error)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(DuneError::Trigger(format!(
                "Failed to execute query: {}",
                reason
            )));
        }

        let parsed = parsed.map_err(|e| DuneError::Trigger(e.to_string()))?;
        match parsed.execution_id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(ExecutionHandle::new(id)),
            None => Err(DuneError::Trigger(format!(
                "Failed to execute query: {}",
                parsed
                    .error
                    .unwrap_or_else(|| "missing execution_id".to_string())
            ))),
        }
    }

    pub async fn execution_status(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<ExecutionStatus, DuneError> {
        let url = format!("{}/execution/{}/status", self.base_url, handle);
        tracing::debug!(execution_id = %handle, "checking execution status");
        let status: ExecutionStatus = self.get_json(&url).await?;
        tracing::debug!(
            execution_id = %handle,
            finished = status.is_execution_finished,
            state = %status.state,
            "status response"
        );
        Ok(status)
    }

    pub async fn execution_results(
        &self,
        handle: &ExecutionHandle,
    ) -> Result<Vec<RawRow>, DuneError> {
        let url = format!("{}/execution/{}/results", self.base_url, handle);
        let results: ResultsResponse = self.get_json(&url).await?;
        let rows = results.into_rows();
        tracing::info!(execution_id = %handle, rows = rows.len(), "fetched execution results");
        Ok(rows)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, DuneError> {
        let response: Response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| DuneError::StatusCheck(e.to_string()))?;

        response
            .json::<T>()
            .await
            .map_err(|e| DuneError::StatusCheck(e.to_string()))
    }
}

impl std::fmt::Debug for DuneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuneClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> DuneClient {
        let base = Url::parse(&server.uri()).unwrap();
        DuneClient::new("test-key", &base).unwrap()
    }

    #[tokio::test]
    async fn execute_sends_key_and_empty_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/query/{}/execute", QUERY_ID)))
            .and(header("x-dune-api-key", "test-key"))
            .and(body_json(json!({ "parameters": {} })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "execution_id": "01HEXEC", "state": "QUERY_STATE_PENDING" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let handle = client_for(&server).await.execute_query().await.unwrap();
        assert_eq!(handle.as_str(), "01HEXEC");
    }

    #[tokio::test]
    async fn execute_error_uses_remote_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid API Key" })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.execute_query().await.unwrap_err();
        assert_eq!(
            err,
            DuneError::Trigger("Failed to execute query: invalid API Key".to_string())
        );
    }

    #[tokio::test]
    async fn execute_error_without_message_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.execute_query().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to execute query: Unknown error");
    }

    #[tokio::test]
    async fn execute_success_without_execution_id_is_trigger_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "error": "query is archived" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.execute_query().await.unwrap_err();
        assert_eq!(
            err,
            DuneError::Trigger("Failed to execute query: query is archived".to_string())
        );
    }

    #[tokio::test]
    async fn execute_success_with_empty_execution_id_is_trigger_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "execution_id": "" })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.execute_query().await.unwrap_err();
        assert_eq!(
            err,
            DuneError::Trigger("Failed to execute query: missing execution_id".to_string())
        );
    }

    #[tokio::test]
    async fn execute_transport_failure_is_trigger_error() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        drop(server);

        let err = client.execute_query().await.unwrap_err();
        assert!(matches!(err, DuneError::Trigger(_)));
    }

    #[tokio::test]
    async fn unreadable_status_is_status_check_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/execution/01HEXEC/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .execution_status(&ExecutionHandle::new("01HEXEC"))
            .await
            .unwrap_err();
        assert!(matches!(err, DuneError::StatusCheck(_)));
    }

    #[tokio::test]
    async fn results_rows_are_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/execution/01HEXEC/results"))
            .and(header("x-dune-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "execution_id": "01HEXEC",
                "result": {
                    "rows": [
                        { "blockchain": "ethereum", "month": "2024-01-01 00:00:00.000 UTC", "gas_fees": 100.5 },
                        { "blockchain": "base", "month": "2024-01-01 00:00:00.000 UTC", "gas_fees": 7 }
                    ],
                    "metadata": { "row_count": 2 }
                }
            })))
            .mount(&server)
            .await;

        let rows = client_for(&server)
            .await
            .execution_results(&ExecutionHandle::new("01HEXEC"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].blockchain, "ethereum");
        assert_eq!(rows[1].gas_fees, 7.0);
    }
}
