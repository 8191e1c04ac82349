//! Configuration types.
//!
//! This module defines the library configuration struct and the enums used for
//! logging options. The CLI layer in `cli.rs` converts parsed flags into these.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DB_PATH, DEFAULT_LISTEN_ADDR, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS,
    MAX_CONCURRENCY_LIMIT, MAX_TIMEOUT_SECS,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// Everything the scanner, the store and the HTTP service need is passed in
/// through this struct; nothing is looked up from global state.
///
/// # Examples
///
/// ```no_run
/// use tls_checker::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("results.db"),
///     max_concurrency: 50,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Maximum number of targets scanned concurrently
    pub max_concurrency: usize,

    /// Per-operation network timeout in seconds
    pub timeout_seconds: u64,

    /// Additional PEM bundle of trust anchors
    pub ca_bundle: Option<PathBuf>,

    /// Whether the bundled Mozilla root set (webpki-roots) is trusted
    pub use_default_roots: bool,

    /// Directory scanned by the URL extractor (extraction disabled when unset)
    pub codebase_root: Option<PathBuf>,

    /// Address the HTTP service binds to
    pub listen_addr: SocketAddr,
}

impl Config {
    /// Returns the per-operation timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Checks that numeric options are within their accepted ranges and that
    /// at least one source of trust anchors is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 || self.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(ConfigError::OutOfRange {
                field: "max_concurrency",
                value: self.max_concurrency.to_string(),
                min: 1,
                max: MAX_CONCURRENCY_LIMIT as u64,
            });
        }
        if self.timeout_seconds == 0 || self.timeout_seconds > MAX_TIMEOUT_SECS {
            return Err(ConfigError::OutOfRange {
                field: "timeout_seconds",
                value: self.timeout_seconds.to_string(),
                min: 1,
                max: MAX_TIMEOUT_SECS,
            });
        }
        if !self.use_default_roots && self.ca_bundle.is_none() {
            return Err(ConfigError::NoTrustAnchors);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            ca_bundle: None,
            use_default_roots: true,
            codebase_root: None,
            listen_addr: DEFAULT_LISTEN_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080))),
        }
    }
}
