use crate::shared::config::{AppConfig, AppConfigBuilder, ConfigError};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "AIDEX_API_URL";
/// Environment variable pointing at a TOML config file
pub const CONFIG_PATH_ENV: &str = "AIDEX_CONFIG";

/// Client configuration wrapper.
#[derive(Debug, Clone)]
pub struct Config {
    app: AppConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder(builder: AppConfigBuilder) -> Result<Self, ConfigError> {
        let app = builder.build()?;
        Ok(Self { app })
    }

    pub fn from_app(app: AppConfig) -> Result<Self, ConfigError> {
        app.validate()?;
        Ok(Self { app })
    }

    /// Load from `AIDEX_CONFIG` (or the per-user config file when present),
    /// then apply `AIDEX_API_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Self::default_path().filter(|p| p.exists()));

        let mut app = match path {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                AppConfig::from_file(path)?
            }
            None => AppConfig::default(),
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            app.server_url = url;
        }

        Self::from_app(app)
    }

    /// `<config dir>/aidex/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aidex").join("config.toml"))
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn server_url(&self) -> &str {
        &self.app.server_url
    }

    pub fn page_size(&self) -> u32 {
        self.app.page_size
    }

    pub fn stale_time(&self) -> Duration {
        self.app.stale_time()
    }

    pub fn query_retry(&self) -> u32 {
        self.app.query_retry
    }

    pub fn search_debounce(&self) -> Duration {
        self.app.search_debounce()
    }

    pub fn refresh_timeout(&self) -> Duration {
        self.app.refresh_timeout()
    }

    pub fn request_timeout(&self) -> Duration {
        self.app.request_timeout()
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }
}
