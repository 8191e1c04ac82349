//! Core data model: scan targets, certificate details, verdicts and results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

/// A URL normalized into the host and port the fetcher connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// The URL as submitted by the caller (trimmed)
    pub url: String,
    pub host: String,
    pub port: u16,
}

/// Outcome of chain-of-trust verification against the configured root store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ChainTrust {
    Trusted,
    Untrusted(String),
}

/// TLS certificate information captured during a handshake.
///
/// Holds the leaf certificate fields together with the handshake metadata the
/// evaluator needs (protocol version, cipher suite, trust outcome).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    /// Hex-encoded serial number, colon separated
    pub serial_number: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// DNS names and IP addresses from the Subject Alternative Name extension, in certificate order
    pub subject_alternative_names: Vec<String>,
    /// Common name from the subject, used when no SANs are present
    pub common_name: Option<String>,
    pub signature_algorithm: String,
    /// Number of certificates presented by the server (leaf included)
    pub chain_length: usize,
    /// Negotiated protocol version, e.g. `TLSv1_3`
    pub tls_version: String,
    /// Negotiated cipher suite, e.g. `TLS13_AES_256_GCM_SHA384`
    pub cipher_suite: String,
    pub chain_trust: ChainTrust,
}

/// Verdict categories, one per scan attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIterMacro,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Valid,
    Expired,
    NotYetValid,
    HostnameMismatch,
    UntrustedChain,
    WeakProtocol,
    ConnectionFailed,
    Timeout,
    UnknownError,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Valid => "VALID",
            Verdict::Expired => "EXPIRED",
            Verdict::NotYetValid => "NOT_YET_VALID",
            Verdict::HostnameMismatch => "HOSTNAME_MISMATCH",
            Verdict::UntrustedChain => "UNTRUSTED_CHAIN",
            Verdict::WeakProtocol => "WEAK_PROTOCOL",
            Verdict::ConnectionFailed => "CONNECTION_FAILED",
            Verdict::Timeout => "TIMEOUT",
            Verdict::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Inverse of [`Verdict::as_str`], used when reading stored rows.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        Verdict::iter().find(|v| v.as_str() == s)
    }

    /// Anything but VALID counts against the batch's failed total.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Verdict::Valid)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verdict plus free-text detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub verdict: Verdict,
    pub detail: String,
}

impl ScanVerdict {
    pub fn new(verdict: Verdict, detail: impl Into<String>) -> Self {
        Self {
            verdict,
            detail: detail.into(),
        }
    }
}

/// The outcome of scanning one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub url: String,
    /// Empty when the URL could not be parsed
    pub host: String,
    pub port: u16,
    pub verdict: Verdict,
    pub detail: String,
    pub scanned_at: DateTime<Utc>,
    pub certificate: Option<CertificateInfo>,
}

impl ScanResult {
    /// Builds a result for a target that produced a certificate (or failed to).
    pub fn for_target(
        target: &ScanTarget,
        certificate: Option<CertificateInfo>,
        verdict: ScanVerdict,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: target.url.clone(),
            host: target.host.clone(),
            port: target.port,
            verdict: verdict.verdict,
            detail: verdict.detail,
            scanned_at,
            certificate,
        }
    }

    /// Builds an UNKNOWN_ERROR result for input that never became a target.
    pub fn malformed(url: &str, reason: &str, scanned_at: DateTime<Utc>) -> Self {
        Self {
            url: url.to_string(),
            host: String::new(),
            port: 0,
            verdict: Verdict::UnknownError,
            detail: format!("malformed URL: {reason}"),
            scanned_at,
            certificate: None,
        }
    }
}

/// Summary of one batch submission, returned once every target is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchJob {
    /// Batch identifier (format: `batch_<timestamp_millis>`)
    pub batch_id: String,
    /// Distinct URLs in submission order
    pub urls: Vec<String>,
    pub total: usize,
    /// Targets that produced a result (any verdict)
    pub processed: usize,
    /// Targets whose verdict is anything but VALID
    pub failed: usize,
    /// Results that could not be written to the store
    pub persist_failures: usize,
    pub verdict_counts: BTreeMap<Verdict, usize>,
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchJob {
    pub fn new(batch_id: String, urls: Vec<String>, started_at: DateTime<Utc>) -> Self {
        let total = urls.len();
        Self {
            batch_id,
            urls,
            total,
            processed: 0,
            failed: 0,
            persist_failures: 0,
            verdict_counts: BTreeMap::new(),
            completed: false,
            started_at,
            finished_at: None,
        }
    }
}
