use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.dune.com/api/v1";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base_url: Url,
    pub poll_interval: Duration,
    pub http_bind_addr: String,
    pub chart_output: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing DUNE_API_KEY env var")]
    MissingApiKey,
    #[error("invalid DUNE_API_BASE_URL {0:?}: {1}")]
    InvalidBaseUrl(String, url::ParseError),
    #[error("invalid POLL_INTERVAL_MS {0:?}")]
    InvalidPollInterval(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // VITE_DUNE_KEY is what the browser build of the dashboard reads.
        let api_key = env::var("DUNE_API_KEY")
            .or_else(|_| env::var("VITE_DUNE_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let raw_base =
            env::var("DUNE_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_base_url(&raw_base)?;

        let poll_interval = match env::var("POLL_INTERVAL_MS") {
            Ok(raw) => parse_poll_interval(&raw)?,
            Err(_) => DEFAULT_POLL_INTERVAL,
        };

        let http_bind_addr = env::var("HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let chart_output = env::var("CHART_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("chart.svg"));

        Ok(Self {
            api_key,
            api_base_url,
            poll_interval,
            http_bind_addr,
            chart_output,
        })
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidBaseUrl(raw.to_string(), e))
}

fn parse_poll_interval(raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .ok_or_else(|| ConfigError::InvalidPollInterval(raw.to_string()))
}
