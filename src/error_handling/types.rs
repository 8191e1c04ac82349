//! Error type definitions.
//!
//! This module defines the typed errors used throughout the application.

use std::time::Duration;

use log::SetLoggerError;
use thiserror::Error;

use crate::models::{ScanVerdict, Verdict};

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error reading or parsing the configured CA bundle.
    #[error("Trust anchor error: {0}")]
    TrustAnchorError(String),

    /// Error building the TLS verifier from the root store.
    #[error("TLS configuration error: {0}")]
    TlsConfigError(String),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be decoded back into a `ScanResult`.
    #[error("Corrupt row for {url}: {reason}")]
    CorruptRow { url: String, reason: String },
}

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: u64,
        max: u64,
    },

    #[error("no trust anchors configured: enable the default roots or pass --ca-bundle")]
    NoTrustAnchors,
}

/// Failures while fetching a certificate from a host.
///
/// Every variant maps to exactly one verdict; see [`FetchError::to_verdict`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError { host: String, message: String },

    #[error("connection to {host}:{port} failed: {message}")]
    ConnectionRefused {
        host: String,
        port: u16,
        message: String,
    },

    #[error("{stage} timed out after {limit:?}")]
    Timeout {
        stage: &'static str,
        limit: Duration,
    },

    #[error("TLS handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("no usable certificate presented: {0}")]
    NoCertificate(String),
}

impl FetchError {
    /// Maps a fetch failure to the verdict recorded for the target.
    ///
    /// ConnectionRefused and DNS errors become CONNECTION_FAILED, timeouts
    /// become TIMEOUT, handshake problems become UNKNOWN_ERROR with detail.
    pub fn to_verdict(&self) -> ScanVerdict {
        let verdict = match self {
            FetchError::DnsError { .. } | FetchError::ConnectionRefused { .. } => {
                Verdict::ConnectionFailed
            }
            FetchError::Timeout { .. } => Verdict::Timeout,
            FetchError::HandshakeFailed(_) | FetchError::NoCertificate(_) => Verdict::UnknownError,
        };
        ScanVerdict::new(verdict, self.to_string())
    }
}
