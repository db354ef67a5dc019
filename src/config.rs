// Runtime configuration, read once at startup and immutable afterwards.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::transit_feed::{FeedError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Feed base URL without a trailing slash, e.g. "https://bus.example.org/api".
    pub base_url: String,
    /// Optional account key appended to every request as ?apiKey=.
    #[serde(default)]
    pub api_key: Option<String>,
    pub route_id: String,
    pub direction_id: String,
    pub stop_id: String,
    #[serde(default = "Config::default_fetch_interval")]
    pub fetch_interval_secs: u64,
    #[serde(default = "Config::default_request_timeout")]
    pub request_timeout_secs: u64,
    /// IANA zone name used for status-line timestamps, e.g. "Europe/Paris".
    #[serde(default = "Config::default_timezone")]
    pub timezone: String,
}

impl Config {
    pub const DEFAULT_PATH: &'static str = "buswatch.json";
    pub const RENDER_INTERVAL_SECS: u64 = 1;

    const FETCH_INTERVAL_SECS: u64 = 10;
    const REQUEST_TIMEOUT_SECS: u64 = 5;

    fn default_fetch_interval() -> u64 {
        Self::FETCH_INTERVAL_SECS
    }

    fn default_request_timeout() -> u64 {
        Self::REQUEST_TIMEOUT_SECS
    }

    fn default_timezone() -> String {
        "UTC".to_string()
    }

    pub fn load(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)
            .map_err(|e| FeedError::ConfigError(format!("Failed to read {:?}: {}", path, e)))?;

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| FeedError::ConfigError(format!("Failed to parse {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch_interval_secs == 0 {
            return Err(FeedError::ConfigError(
                "fetch_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(FeedError::ConfigError(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(FeedError::ConfigError(format!(
                "Unknown timezone: {}",
                self.timezone
            )));
        }
        Ok(())
    }

    /// Zone for log timestamps. Falls back to UTC, but `validate` has
    /// already rejected unknown names by the time this is called.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::Tz::UTC)
    }
}
