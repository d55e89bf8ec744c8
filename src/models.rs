use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of one remote query run, as handed out by the execute endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One (blockchain, month, fee) observation from the query result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub blockchain: String,
    pub month: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub gas_fees: f64,
}

/// Aggregate columns come back as `null` for empty groups.
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Option::<f64>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// One pivoted month. Serializes flat: `{"month": "...", "ethereum": 1.0, ...}`.
///
/// `values` never holds a `month` key; `pivot_rows` drops such rows so the flat form
/// stays free of duplicate keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub month: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl ChartRow {
    pub fn blockchains(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn value(&self, blockchain: &str) -> f64 {
        self.values.get(blockchain).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteResponse {
    pub execution_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionStatus {
    #[serde(default)]
    pub is_execution_finished: bool,
    #[serde(default)]
    pub state: String,
}

impl ExecutionStatus {
    pub const FAILED_STATE: &'static str = "FAILED";

    pub fn is_failed(&self) -> bool {
        self.state == Self::FAILED_STATE
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultsResponse {
    #[serde(default)]
    pub result: Option<ResultSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

impl ResultsResponse {
    pub fn into_rows(self) -> Vec<RawRow> {
        self.result.map(|r| r.rows).unwrap_or_default()
    }
}
