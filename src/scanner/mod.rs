//! Batch scanning.
//!
//! [`BatchScanner`] takes a list of URLs, scans each distinct one under a
//! concurrency limit, persists every result and returns a [`BatchJob`]
//! summary once the last target has been recorded.

mod worker;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, error, info, warn};

use crate::app::{dedup_urls, log_progress, normalize_target};
use crate::config::{Config, PROGRESS_LOG_INTERVAL};
use crate::error_handling::{DatabaseError, ScanStats};
use crate::extractor::UrlExtractor;
use crate::initialization::init_semaphore;
use crate::models::{BatchJob, ScanResult, ScanVerdict, Verdict};
use crate::storage::ResultStore;
use crate::tls::CertificateFetcher;

use worker::{persist_with_retry, scan_target, worker_deadline};

/// Process-wide counter that keeps batch ids unique within one millisecond.
static BATCH_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_batch_id(started_at: DateTime<Utc>) -> String {
    let seq = BATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("batch_{}_{seq}", started_at.timestamp_millis())
}

/// Knobs the scanner reads for every batch.
#[derive(Debug, Clone, Copy)]
pub struct ScannerSettings {
    /// Maximum number of targets fetched at once
    pub max_concurrency: usize,
    /// Per-stage network timeout handed to the fetcher
    pub timeout: Duration,
}

impl From<&Config> for ScannerSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            timeout: config.timeout(),
        }
    }
}

/// Fans a batch of URLs out to the certificate fetcher and evaluator and
/// records every verdict in the result store.
///
/// Collaborators are injected so tests can swap in fakes.
pub struct BatchScanner {
    fetcher: Arc<dyn CertificateFetcher>,
    store: Arc<dyn ResultStore>,
    extractor: Arc<dyn UrlExtractor>,
    settings: ScannerSettings,
}

impl BatchScanner {
    pub fn new(
        fetcher: Arc<dyn CertificateFetcher>,
        store: Arc<dyn ResultStore>,
        extractor: Arc<dyn UrlExtractor>,
        settings: ScannerSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            extractor,
            settings,
        }
    }

    /// Scans every distinct URL in `urls` and stores the results.
    ///
    /// Returns once each target has either a stored result or a logged
    /// persistence failure. Per-target problems (malformed input, network
    /// errors, panics, store errors) are recorded and never abort the batch.
    pub async fn scan_and_store_urls(&self, urls: &[String]) -> BatchJob {
        let started_at = Utc::now();
        let batch_id = next_batch_id(started_at);
        let distinct = dedup_urls(urls);
        let mut job = BatchJob::new(batch_id.clone(), distinct, started_at);

        info!(
            "Starting {batch_id}: {} URL(s) submitted, {} distinct",
            urls.len(),
            job.total
        );

        let start_time = Instant::now();
        let stats = Arc::new(ScanStats::new());
        let completed = Arc::new(AtomicUsize::new(0));
        let semaphore = init_semaphore(self.settings.max_concurrency.max(1));
        let timeout = self.settings.timeout;
        let deadline = worker_deadline(timeout);

        let mut tasks = FuturesUnordered::new();

        for url in &job.urls {
            let target = match normalize_target(url) {
                Ok(target) => target,
                Err(reason) => {
                    warn!("Skipping malformed URL {url}: {reason}");
                    let result = ScanResult::malformed(url, &reason, Utc::now());
                    self.record(&stats, &result).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                    continue;
                }
            };

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // Only happens if the semaphore is closed, which this scanner never does
                    error!("Semaphore closed, recording {url} as unknown error");
                    let verdict =
                        ScanVerdict::new(Verdict::UnknownError, "scan could not be scheduled");
                    let result = ScanResult::for_target(&target, None, verdict, Utc::now());
                    self.record(&stats, &result).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                    continue;
                }
            };

            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            let task_target = target.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result = scan_target(fetcher.as_ref(), &task_target, timeout, deadline).await;
                let persisted = persist_with_retry(&store, &result).await;
                (result.verdict, persisted)
            });
            // Keep the target next to its handle so a panic can still be attributed
            tasks.push(async move { (target, handle.await) });
        }

        let mut progress = tokio::time::interval(PROGRESS_LOG_INTERVAL);
        progress.tick().await;

        loop {
            tokio::select! {
                next = tasks.next() => {
                    let Some((target, joined)) = next else { break };
                    match joined {
                        Ok((verdict, persisted)) => {
                            stats.record(verdict);
                            if !persisted {
                                stats.record_persist_failure();
                            }
                        }
                        Err(join_error) => {
                            warn!("Scan task for {} panicked: {join_error}", target.url);
                            let verdict = ScanVerdict::new(
                                Verdict::UnknownError,
                                format!("scan worker failed: {join_error}"),
                            );
                            let result = ScanResult::for_target(&target, None, verdict, Utc::now());
                            self.record(&stats, &result).await;
                        }
                    }
                    completed.fetch_add(1, Ordering::SeqCst);
                }
                _ = progress.tick() => {
                    log_progress(&batch_id, start_time, &completed, job.total);
                }
            }
        }

        log_progress(&batch_id, start_time, &completed, job.total);
        stats.log_summary(&batch_id);

        job.processed = stats.total();
        job.failed = stats.total_failed();
        job.persist_failures = stats.persist_failures();
        job.verdict_counts = stats.snapshot();
        job.completed = true;
        job.finished_at = Some(Utc::now());

        if let Err(e) = self.store.record_batch(&job).await {
            warn!("Failed to record summary for {batch_id}: {e}");
        }

        job
    }

    /// Latest stored result of every URL, ordered by URL.
    pub async fn get_scan_results(&self) -> Result<Vec<ScanResult>, DatabaseError> {
        self.store.get_all().await
    }

    /// URLs found by the configured extractor.
    pub async fn extract_urls_from_codebase(&self) -> Result<Vec<String>> {
        let urls = self.extractor.extract().await?;
        debug!("Extractor returned {} URLs", urls.len());
        Ok(urls)
    }

    /// Persists a result produced outside a worker and counts it.
    async fn record(&self, stats: &ScanStats, result: &ScanResult) {
        stats.record(result.verdict);
        if !persist_with_retry(&self.store, result).await {
            stats.record_persist_failure();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::FetchError;
    use crate::models::{CertificateInfo, ChainTrust};
    use crate::storage::MemoryResultStore;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    /// Serves certificates keyed by host; unknown hosts are refused and a
    /// host named `panic.test` panics.
    struct FakeFetcher;

    #[async_trait]
    impl CertificateFetcher for FakeFetcher {
        async fn fetch(
            &self,
            host: &str,
            port: u16,
            _timeout: Duration,
        ) -> Result<CertificateInfo, FetchError> {
            let now = Utc::now();
            let mut cert = CertificateInfo {
                subject: format!("CN={host}"),
                issuer: "CN=Test CA".to_string(),
                serial_number: "01".to_string(),
                not_before: now - ChronoDuration::days(1),
                not_after: now + ChronoDuration::days(90),
                subject_alternative_names: vec![host.to_string()],
                common_name: Some(host.to_string()),
                signature_algorithm: "sha256WithRSAEncryption".to_string(),
                chain_length: 2,
                tls_version: "TLSv1_3".to_string(),
                cipher_suite: "TLS13_AES_128_GCM_SHA256".to_string(),
                chain_trust: ChainTrust::Trusted,
            };
            match host {
                "good.test" => Ok(cert),
                "expired.test" => {
                    cert.not_after = now - ChronoDuration::days(3);
                    Ok(cert)
                }
                "panic.test" => panic!("fetcher bug"),
                _ => Err(FetchError::ConnectionRefused {
                    host: host.to_string(),
                    port,
                    message: "refused".to_string(),
                }),
            }
        }
    }

    struct NoExtractor;

    #[async_trait]
    impl UrlExtractor for NoExtractor {
        async fn extract(&self) -> Result<Vec<String>> {
            Ok(vec!["https://found.test".to_string()])
        }
    }

    fn scanner(store: Arc<MemoryResultStore>) -> BatchScanner {
        BatchScanner::new(
            Arc::new(FakeFetcher),
            store,
            Arc::new(NoExtractor),
            ScannerSettings {
                max_concurrency: 2,
                timeout: Duration::from_secs(1),
            },
        )
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batch_records_every_url() {
        let store = Arc::new(MemoryResultStore::new());
        let scanner = scanner(Arc::clone(&store));

        let job = scanner
            .scan_and_store_urls(&urls(&[
                "https://good.test",
                "not a url at all",
                "https://expired.test",
                "https://down.test:8443",
            ]))
            .await;

        assert!(job.completed);
        assert_eq!(job.total, 4);
        assert_eq!(job.processed, 4);
        assert_eq!(job.failed, 3);
        assert_eq!(job.verdict_counts.get(&Verdict::Valid), Some(&1));
        assert_eq!(job.verdict_counts.get(&Verdict::Expired), Some(&1));
        assert_eq!(job.verdict_counts.get(&Verdict::UnknownError), Some(&1));
        assert_eq!(job.verdict_counts.get(&Verdict::ConnectionFailed), Some(&1));

        for url in &job.urls {
            assert!(
                store.get_by_url(url).await.expect("query").is_some(),
                "missing result for {url}"
            );
        }
        let down = store
            .get_by_url("https://down.test:8443")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(down.port, 8443);
        assert_eq!(store.batches().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicates_are_scanned_once() {
        let store = Arc::new(MemoryResultStore::new());
        let job = scanner(Arc::clone(&store))
            .scan_and_store_urls(&urls(&[
                "https://good.test",
                " https://good.test ",
                "https://good.test",
            ]))
            .await;
        assert_eq!(job.urls, vec!["https://good.test"]);
        assert_eq!(job.processed, 1);
    }

    #[tokio::test]
    async fn test_panicking_worker_is_contained() {
        let store = Arc::new(MemoryResultStore::new());
        let job = scanner(Arc::clone(&store))
            .scan_and_store_urls(&urls(&["https://panic.test", "https://good.test"]))
            .await;

        assert_eq!(job.processed, 2);
        let panicked = store
            .get_by_url("https://panic.test")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(panicked.verdict, Verdict::UnknownError);
        let good = store
            .get_by_url("https://good.test")
            .await
            .expect("query")
            .expect("present");
        assert_eq!(good.verdict, Verdict::Valid);
    }

    #[test]
    fn test_batch_ids_unique_within_one_millisecond() {
        let now = Utc::now();
        let first = next_batch_id(now);
        let second = next_batch_id(now);
        assert_ne!(first, second);
        assert!(first.starts_with(&format!("batch_{}_", now.timestamp_millis())));
    }

    #[tokio::test]
    async fn test_concurrent_batches_record_separate_summaries() {
        let store = Arc::new(MemoryResultStore::new());
        let scanner = scanner(Arc::clone(&store));
        let first_urls = urls(&["https://good.test"]);
        let second_urls = urls(&["https://expired.test"]);

        let (first, second) = tokio::join!(
            scanner.scan_and_store_urls(&first_urls),
            scanner.scan_and_store_urls(&second_urls),
        );

        assert_ne!(first.batch_id, second.batch_id);
        let batches = store.batches().await;
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().any(|b| b.urls == first_urls));
        assert!(batches.iter().any(|b| b.urls == second_urls));
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        let store = Arc::new(MemoryResultStore::new());
        let job = scanner(Arc::clone(&store)).scan_and_store_urls(&[]).await;
        assert!(job.completed);
        assert_eq!(job.total, 0);
        assert_eq!(job.processed, 0);
    }

    #[tokio::test]
    async fn test_get_scan_results_is_idempotent() {
        let store = Arc::new(MemoryResultStore::new());
        let scanner = scanner(Arc::clone(&store));
        scanner
            .scan_and_store_urls(&urls(&["https://good.test", "https://expired.test"]))
            .await;

        let first = scanner.get_scan_results().await.expect("first");
        let second = scanner.get_scan_results().await.expect("second");
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_extract_delegates_to_extractor() {
        let store = Arc::new(MemoryResultStore::new());
        let urls = scanner(store)
            .extract_urls_from_codebase()
            .await
            .expect("extract");
        assert_eq!(urls, vec!["https://found.test"]);
    }
}
