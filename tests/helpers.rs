// Shared test helpers: fake collaborators and scanner construction.
//
// The fake fetcher never touches the network; certificates are derived from
// the requested host name.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use tls_checker::{
    BatchScanner, CertificateFetcher, CertificateInfo, ChainTrust, FetchError, ResultStore,
    ScannerSettings, SqliteResultStore, UrlExtractor,
};

/// Hosts behave according to their first label:
/// `good.*` valid, `expired.*` expired, `mismatch.*` wrong SAN,
/// `untrusted.*` untrusted chain, `slow.*` timeout, anything else refused.
#[derive(Default)]
pub struct FakeFetcher {
    pub calls: AtomicUsize,
}

#[allow(dead_code)] // Used by other test files
impl FakeFetcher {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateFetcher for FakeFetcher {
    async fn fetch(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<CertificateInfo, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let mut cert = CertificateInfo {
            subject: format!("CN={host}"),
            issuer: "CN=Fake Issuing CA, O=Tests".to_string(),
            serial_number: "0a:0b".to_string(),
            not_before: now - chrono::Duration::days(10),
            not_after: now + chrono::Duration::days(120),
            subject_alternative_names: vec![host.to_string()],
            common_name: Some(host.to_string()),
            signature_algorithm: "sha256WithRSAEncryption".to_string(),
            chain_length: 3,
            tls_version: "TLSv1_3".to_string(),
            cipher_suite: "TLS13_AES_256_GCM_SHA384".to_string(),
            chain_trust: ChainTrust::Trusted,
        };

        let label = host.split('.').next().unwrap_or_default();
        match label {
            "good" => Ok(cert),
            "expired" => {
                cert.not_after = now - chrono::Duration::days(2);
                Ok(cert)
            }
            "mismatch" => {
                cert.subject_alternative_names = vec!["other.example".to_string()];
                Ok(cert)
            }
            "untrusted" => {
                cert.chain_trust = ChainTrust::Untrusted("UnknownIssuer".to_string());
                Ok(cert)
            }
            "slow" => Err(FetchError::Timeout {
                stage: "TLS handshake",
                limit: timeout,
            }),
            _ => Err(FetchError::ConnectionRefused {
                host: host.to_string(),
                port,
                message: "Connection refused (os error 111)".to_string(),
            }),
        }
    }
}

/// Extractor returning a fixed list.
pub struct FixedExtractor(pub Vec<String>);

#[async_trait]
impl UrlExtractor for FixedExtractor {
    async fn extract(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

pub fn settings() -> ScannerSettings {
    ScannerSettings {
        max_concurrency: 4,
        timeout: Duration::from_secs(2),
    }
}

/// Builds a scanner over the given store with a fresh fake fetcher.
pub fn scanner_with_store(
    store: Arc<dyn ResultStore>,
    extracted: Vec<String>,
) -> (BatchScanner, Arc<FakeFetcher>) {
    let fetcher = Arc::new(FakeFetcher::default());
    let scanner = BatchScanner::new(
        Arc::clone(&fetcher) as Arc<dyn CertificateFetcher>,
        store,
        Arc::new(FixedExtractor(extracted)),
        settings(),
    );
    (scanner, fetcher)
}

/// Opens a SQLite store in `dir` with migrations applied.
#[allow(dead_code)] // Used by other test files
pub async fn sqlite_store(dir: &Path) -> Arc<SqliteResultStore> {
    Arc::new(
        SqliteResultStore::open(&dir.join("results.db"))
            .await
            .expect("Failed to open SQLite store"),
    )
}

#[allow(dead_code)] // Used by other test files
pub fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
