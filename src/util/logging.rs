//! Structured logging setup for dxformat
//!
//! Logging goes through `tracing`. The subscriber writes to stderr so that
//! report output on stdout stays machine-readable.
//!
//! # Example
//!
//! ```no_run
//! use dxformat::util::logging;
//!
//! logging::init_from_env();
//!
//! tracing::debug!(path = "image.ser", "Resolving format");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for `dxformat` targets
    pub level: Level,

    /// Emit one JSON object per event instead of console lines
    pub use_json: bool,

    /// Include the module target (e.g., dxformat::format::registry) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// JSON output with source locations, for log collectors.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
        }
    }

    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            use_json: false,
            include_target: true,
            include_location: true,
        }
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::from_default_env();
        let mut directives = vec![format!("dxformat={}", self.level)];

        // Keep the HTTP client quiet unless RUST_LOG asks otherwise
        if env::var("RUST_LOG").is_err() {
            directives.extend(["hyper=warn", "reqwest=warn"].map(String::from));
        }

        for directive in directives {
            if let Ok(directive) = directive.parse::<Directive>() {
                filter = filter.add_directive(directive);
            }
        }
        filter
    }
}

/// Parses a log level, falling back to `INFO` for unknown names
///
/// ```
/// use dxformat::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("WARN"), Level::WARN);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.filter();

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}

/// Initializes logging from `DXFORMAT_LOG_LEVEL` and `DXFORMAT_LOG_JSON`
///
/// `RUST_LOG` is still honoured for targets outside this crate.
pub fn init_from_env() {
    init_logging(config_from_env(None));
}

/// Builds a config from the environment, letting `level` override
/// `DXFORMAT_LOG_LEVEL` when given. JSON output uses the
/// [`LoggingConfig::production`] layout.
pub fn config_from_env(level: Option<Level>) -> LoggingConfig {
    let level = level.unwrap_or_else(|| {
        let level_str = env::var("DXFORMAT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    });

    let use_json = env::var("DXFORMAT_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    let base = if use_json {
        LoggingConfig::production()
    } else {
        LoggingConfig::default()
    };
    LoggingConfig { level, ..base }
}
