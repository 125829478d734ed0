//! Configuration management for dxformat
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `DXFORMAT_LOG_LEVEL`: Logging level - default: "info"
//! - `DXFORMAT_MIN_CONFIDENCE`: Minimum format score required before header
//!   models are trusted - default: "1"
//! - `DXFORMAT_REMOTE_TIMEOUT`: Timeout in seconds for images opened by URL -
//!   default: "30"
//!
//! # Example
//!
//! ```no_run
//! use dxformat::DxformatConfig;
//!
//! let config = DxformatConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::stream::StreamConfig;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MIN_CONFIDENCE: u32 = 1;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime configuration for format resolution and stream access
#[derive(Debug, Clone)]
pub struct DxformatConfig {
    /// Minimum score a resolved format must reach
    pub min_confidence: u32,

    /// Timeout in seconds for remote images
    pub remote_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for DxformatConfig {
    /// Loads from `DXFORMAT_*` environment variables, falling back to
    /// defaults for anything missing or unparseable.
    fn default() -> Self {
        let min_confidence = env::var("DXFORMAT_MIN_CONFIDENCE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MIN_CONFIDENCE);

        let remote_timeout_secs = env::var("DXFORMAT_REMOTE_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REMOTE_TIMEOUT_SECS);

        let log_level = env::var("DXFORMAT_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            min_confidence,
            remote_timeout_secs,
            log_level,
        }
    }
}

impl DxformatConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is out of range or the log level is
    /// unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_confidence == 0 {
            return Err(ConfigError::ValidationFailed(
                "Minimum confidence must be at least 1".to_string(),
            ));
        }

        if self.remote_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Remote timeout must be at least 1 second".to_string(),
            ));
        }
        if self.remote_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Remote timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Stream options derived from this configuration
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            remote_timeout: Duration::from_secs(self.remote_timeout_secs),
        }
    }
}

impl fmt::Display for DxformatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dxformat Configuration:")?;
        writeln!(f, "  Minimum Confidence: {}", self.min_confidence)?;
        writeln!(f, "  Remote Timeout: {}s", self.remote_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
