//! Configuration constants.
//!
//! Timeouts, limits and defaults shared by the scanner, the fetcher and the
//! HTTP service.

use std::time::Duration;

/// Default maximum number of targets scanned at the same time (semaphore limit)
pub const DEFAULT_MAX_CONCURRENCY: usize = 20;
/// Upper bound accepted by `Config::validate`
pub const MAX_CONCURRENCY_LIMIT: usize = 500;

/// Default per-target network timeout in seconds (DNS, TCP connect and TLS handshake each)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Upper bound accepted by `Config::validate`
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Extra time granted to a worker on top of its network timeouts before the
/// scanner gives up on it and records a TIMEOUT verdict.
pub const WORKER_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How often a running batch logs its progress
pub const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Port used when a URL does not carry one
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Maximum URL length (2048 characters), matching common browser and server limits.
pub const MAX_URL_LENGTH: usize = 2048;

pub const DB_PATH: &str = "./tls_checker.db";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

// Persistence retry strategy
/// Delay in milliseconds before the single persistence retry
pub const STORE_RETRY_INITIAL_DELAY_MS: u64 = 200;
/// Number of retries after the first failed write
pub const STORE_RETRY_ATTEMPTS: usize = 1;

// Codebase URL extraction
/// Files larger than this are skipped by the extractor (1MB)
pub const MAX_EXTRACT_FILE_SIZE: u64 = 1024 * 1024;
/// Directory names the extractor never descends into
pub const EXTRACT_SKIPPED_DIRS: &[&str] = &["target", "node_modules", "vendor"];
/// File extensions the extractor reads
pub const EXTRACT_FILE_EXTENSIONS: &[&str] = &[
    "rs", "toml", "yml", "yaml", "json", "php", "module", "inc", "install", "twig", "js", "ts",
    "html", "md", "txt", "env", "conf", "ini", "py", "go", "java",
];

/// Certificates expiring within this many days still get a VALID verdict,
/// but the detail text flags them.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Substrings marking a negotiated cipher suite as weak
pub const WEAK_CIPHER_MARKERS: &[&str] = &["NULL", "EXPORT", "RC4", "DES", "MD5", "ANON"];

/// Error message returned by the batch endpoint when no URLs were supplied
pub const NO_URLS_ERROR: &str = "No URLs provided for scanning.";
