//! Configuration module for rxwatch
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`RXWATCH_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use rxwatch::config::RxwatchConfig;
//!
//! let config = RxwatchConfig::default();
//! assert_eq!(config.backend.base_url, "http://localhost:8000");
//!
//! let toml = r#"
//! [backend]
//! base_url = "http://risk.internal:9000"
//! "#;
//! let config: RxwatchConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.backend.base_url, "http://risk.internal:9000");
//! ```

pub mod analytics;
pub mod backend;
pub mod error;
pub mod logging;
pub mod streaming;

pub use analytics::AnalyticsConfig;
pub use backend::BackendConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig, LOG_MODULES};
pub use streaming::{ReconnectConfig, StreamingConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the operator console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RxwatchConfig {
    /// Risk backend location and call timeouts
    pub backend: BackendConfig,
    /// Push channel settings
    pub streaming: StreamingConfig,
    /// Analytics fetch sizes
    pub analytics: AnalyticsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Drug names offered as one-keystroke example searches
    pub examples: Vec<String>,
}

impl Default for RxwatchConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            streaming: StreamingConfig::default(),
            analytics: AnalyticsConfig::default(),
            logging: LoggingConfig::default(),
            examples: default_examples(),
        }
    }
}

fn default_examples() -> Vec<String> {
    ["metformin", "hydroxyzine", "clonidine", "celebrex", "lamictal"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl RxwatchConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports RXWATCH_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("RXWATCH_BACKEND_URL") {
            if !url.trim().is_empty() {
                self.backend.base_url = url;
            }
        }

        if let Ok(level) = std::env::var("RXWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("RXWATCH_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(reconnect) = std::env::var("RXWATCH_RECONNECT") {
            match reconnect.to_lowercase().as_str() {
                "true" => self.streaming.reconnect.enabled = true,
                "false" => self.streaming.reconnect.enabled = false,
                _ => {}
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::invalid("backend.base_url", "URL cannot be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "backend.base_url",
                "URL must start with http:// or https://",
            ));
        }

        let timeouts = [
            ("backend.search_timeout_seconds", self.backend.search_timeout_seconds),
            ("backend.health_timeout_seconds", self.backend.health_timeout_seconds),
            ("backend.analytics_timeout_seconds", self.backend.analytics_timeout_seconds),
            ("backend.seed_timeout_seconds", self.backend.seed_timeout_seconds),
            ("streaming.connect_timeout_seconds", self.streaming.connect_timeout_seconds),
        ];
        for (field, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::invalid(field, "timeout must be non-zero"));
            }
        }

        if self.analytics.top_risks_limit == 0 {
            return Err(ConfigError::invalid(
                "analytics.top_risks_limit",
                "limit must be non-zero",
            ));
        }
        if self.analytics.heatmap_limit == 0 {
            return Err(ConfigError::invalid(
                "analytics.heatmap_limit",
                "limit must be non-zero",
            ));
        }

        let reconnect = &self.streaming.reconnect;
        if reconnect.max_backoff_ms < reconnect.initial_backoff_ms {
            return Err(ConfigError::invalid(
                "streaming.reconnect.max_backoff_ms",
                "must be at least initial_backoff_ms",
            ));
        }

        if self.streaming.max_message_bytes == 0 {
            return Err(ConfigError::invalid(
                "streaming.max_message_bytes",
                "limit must be non-zero",
            ));
        }

        if self.streaming.path_segments().is_empty() {
            return Err(ConfigError::invalid("streaming.path", "path cannot be empty"));
        }

        self.logging.validate()
    }
}
