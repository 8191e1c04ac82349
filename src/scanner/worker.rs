//! Per-target scan work: fetch, evaluate, persist.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, error, warn};
use tokio_retry::Retry;

use crate::config::WORKER_GRACE_PERIOD;
use crate::error_handling::get_store_retry_strategy;
use crate::evaluate::evaluate;
use crate::models::{ScanResult, ScanTarget, ScanVerdict, Verdict};
use crate::storage::ResultStore;
use crate::tls::CertificateFetcher;

/// Upper bound on one target's fetch and evaluation.
///
/// Individual network stages are already bounded by `timeout`; this catches
/// anything that still hangs.
pub(crate) fn worker_deadline(timeout: Duration) -> Duration {
    timeout * 2 + WORKER_GRACE_PERIOD
}

/// Fetches and evaluates one target. Never fails: every outcome is a verdict.
///
/// `deadline` bounds the whole fetch; see [`worker_deadline`].
pub(crate) async fn scan_target(
    fetcher: &dyn CertificateFetcher,
    target: &ScanTarget,
    timeout: Duration,
    deadline: Duration,
) -> ScanResult {
    let fetched = tokio::time::timeout(
        deadline,
        fetcher.fetch(&target.host, target.port, timeout),
    )
    .await;
    let now = Utc::now();

    match fetched {
        Ok(Ok(certificate)) => {
            let verdict = evaluate(&certificate, &target.host, now);
            debug!("{} -> {}: {}", target.url, verdict.verdict, verdict.detail);
            ScanResult::for_target(target, Some(certificate), verdict, now)
        }
        Ok(Err(e)) => {
            debug!("Fetch failed for {}: {e}", target.url);
            ScanResult::for_target(target, None, e.to_verdict(), now)
        }
        Err(_) => {
            warn!(
                "Scan of {} exceeded {:?}, recording timeout",
                target.url, deadline
            );
            let verdict = ScanVerdict::new(
                Verdict::Timeout,
                format!("scan did not finish within {deadline:?}"),
            );
            ScanResult::for_target(target, None, verdict, now)
        }
    }
}

/// Writes `result` to the store, retrying once.
///
/// Returns `false` when the result was dropped; the failure is logged here.
pub(crate) async fn persist_with_retry(store: &Arc<dyn ResultStore>, result: &ScanResult) -> bool {
    match Retry::start(get_store_retry_strategy(), || store.upsert(result)).await {
        Ok(()) => true,
        Err(e) => {
            error!("Dropping result for {} after retry: {e}", result.url);
            false
        }
    }
}
