//! Application configuration module
//!
//! Provides the tunables of the client core: where the API lives and how the
//! session and query layers behave. Values can come from a TOML file, the
//! builder, or the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default API base URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5555/";
/// Default number of monsters per gallery page
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Default time before a cached read becomes eligible for refetch (5 minutes)
pub const DEFAULT_STALE_TIME_MS: u64 = 5 * 60 * 1000;
/// Default retry count for failed reads
pub const DEFAULT_QUERY_RETRY: u32 = 1;
/// Default search debounce interval
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
/// Default upper bound for a token refresh call
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 10_000;
/// Default upper bound for any other request
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API base URL
    pub server_url: String,
    /// Gallery page size
    pub page_size: u32,
    /// Staleness window for cached reads, in milliseconds
    pub stale_time_ms: u64,
    /// Automatic retries for transient read failures
    pub query_retry: u32,
    /// Search debounce interval, in milliseconds
    pub search_debounce_ms: u64,
    /// Token refresh timeout, in milliseconds
    pub refresh_timeout_ms: u64,
    /// Request timeout, in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            stale_time_ms: DEFAULT_STALE_TIME_MS,
            query_retry: DEFAULT_QUERY_RETRY,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            refresh_timeout_ms: DEFAULT_REFRESH_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.server_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.server_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                self.server_url
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue("page_size must be positive"));
        }
        if self.refresh_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("refresh_timeout_ms must be positive"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("request_timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn stale_time(mut self, stale_time: Duration) -> Self {
        self.config.stale_time_ms = stale_time.as_millis() as u64;
        self
    }

    pub fn query_retry(mut self, retries: u32) -> Self {
        self.config.query_retry = retries;
        self
    }

    pub fn search_debounce(mut self, debounce: Duration) -> Self {
        self.config.search_debounce_ms = debounce.as_millis() as u64;
        self
    }

    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.config.refresh_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    #[error("failed to read config: {0}")]
    Io(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
}
