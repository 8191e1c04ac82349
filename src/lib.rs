//! tls_checker library: batch TLS certificate checking
//!
//! This library scans batches of URLs, inspects the certificate each host
//! presents, derives a verdict (valid, expired, hostname mismatch, untrusted
//! chain, weak protocol, connection failure, ...) and keeps the latest verdict
//! per URL in a result store.
//!
//! # Example
//!
//! ```no_run
//! use tls_checker::{build_scanner, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     max_concurrency: 50,
//!     ..Default::default()
//! };
//!
//! let scanner = build_scanner(&config).await?;
//! let job = scanner
//!     .scan_and_store_urls(&["https://example.com".to_string()])
//!     .await;
//! println!("{}: {} processed, {} non-valid", job.batch_id, job.processed, job.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod app;
pub mod config;
mod error_handling;
pub mod evaluate;
pub mod extractor;
pub mod initialization;
mod models;
pub mod scanner;
pub mod server;
pub mod storage;
pub mod tls;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{ConfigError, DatabaseError, FetchError, InitializationError};
pub use extractor::{CodebaseUrlExtractor, UrlExtractor};
pub use models::{
    BatchJob, CertificateInfo, ChainTrust, ScanResult, ScanTarget, ScanVerdict, Verdict,
};
pub use run::{build_scanner, read_url_list};
pub use scanner::{BatchScanner, ScannerSettings};
pub use storage::{MemoryResultStore, ResultStore, SqliteResultStore};
pub use tls::{CertificateFetcher, TlsFetcher};

// Wiring of the production collaborators
mod run {
    use std::path::Path;
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use log::info;
    use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

    use crate::config::Config;
    use crate::extractor::CodebaseUrlExtractor;
    use crate::initialization::build_root_store;
    use crate::scanner::{BatchScanner, ScannerSettings};
    use crate::storage::SqliteResultStore;
    use crate::tls::TlsFetcher;

    /// Builds a scanner backed by the TLS fetcher, the SQLite store at
    /// `config.db_path` and the codebase extractor.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The configuration is out of range
    /// - The trust anchors cannot be loaded
    /// - The database cannot be opened or migrated
    pub async fn build_scanner(config: &Config) -> Result<BatchScanner> {
        config.validate().context("Invalid configuration")?;

        let roots = build_root_store(config).context("Failed to load trust anchors")?;
        let fetcher =
            TlsFetcher::new(Arc::new(roots)).context("Failed to initialize TLS fetcher")?;
        let store = SqliteResultStore::open(&config.db_path)
            .await
            .context("Failed to initialize result store")?;
        let extractor = CodebaseUrlExtractor::new(config.codebase_root.clone());

        info!(
            "Scanner ready (concurrency {}, timeout {}s, database {})",
            config.max_concurrency,
            config.timeout_seconds,
            config.db_path.display()
        );

        Ok(BatchScanner::new(
            Arc::new(fetcher),
            Arc::new(store),
            Arc::new(extractor),
            ScannerSettings::from(config),
        ))
    }

    /// Reads a URL list from `path`, or from stdin when `path` is `-`.
    ///
    /// One URL per line; blank lines and lines starting with `#` are skipped.
    pub async fn read_url_list(path: &Path) -> Result<Vec<String>> {
        if path.as_os_str() == "-" {
            info!("Reading URLs from stdin");
            read_lines(tokio::io::stdin()).await
        } else {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            read_lines(file).await
        }
    }

    async fn read_lines<R: AsyncRead + Unpin>(reader: R) -> Result<Vec<String>> {
        let mut lines = BufReader::new(reader).lines();
        let mut urls = Vec::new();
        while let Some(line) = lines.next_line().await.context("Failed to read input")? {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            urls.push(trimmed.to_string());
        }
        Ok(urls)
    }

}
