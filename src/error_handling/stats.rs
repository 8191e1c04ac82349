//! Scan statistics tracking.
//!
//! Thread-safe per-verdict counters shared by the workers of one batch.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;
use strum::IntoEnumIterator;

use crate::models::Verdict;

/// Thread-safe verdict counters.
///
/// Every verdict is initialized to zero on creation, so incrementing never
/// needs to insert. Share across tasks with `Arc`.
pub struct ScanStats {
    verdicts: HashMap<Verdict, AtomicUsize>,
    persist_failures: AtomicUsize,
}

impl ScanStats {
    pub fn new() -> Self {
        let mut verdicts = HashMap::new();
        for verdict in Verdict::iter() {
            verdicts.insert(verdict, AtomicUsize::new(0));
        }

        ScanStats {
            verdicts,
            persist_failures: AtomicUsize::new(0),
        }
    }

    /// Increment the counter for a verdict.
    pub fn record(&self, verdict: Verdict) {
        if let Some(counter) = self.verdicts.get(&verdict) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment verdict counter for {:?} which is not in the map. \
                 This indicates a bug in ScanStats initialization.",
                verdict
            );
        }
    }

    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the count for a verdict.
    pub fn get_count(&self, verdict: Verdict) -> usize {
        self.verdicts
            .get(&verdict)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn persist_failures(&self) -> usize {
        self.persist_failures.load(Ordering::SeqCst)
    }

    /// Total number of recorded verdicts.
    pub fn total(&self) -> usize {
        self.verdicts.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Total number of non-VALID verdicts.
    pub fn total_failed(&self) -> usize {
        Verdict::iter()
            .filter(Verdict::is_failure)
            .map(|v| self.get_count(v))
            .sum()
    }

    /// Non-zero counts, ordered by verdict.
    pub fn snapshot(&self) -> BTreeMap<Verdict, usize> {
        Verdict::iter()
            .map(|v| (v, self.get_count(v)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Logs a one-line-per-verdict breakdown.
    pub fn log_summary(&self, batch_id: &str) {
        info!(
            "Batch {batch_id}: {} result(s), {} non-valid, {} persistence failure(s)",
            self.total(),
            self.total_failed(),
            self.persist_failures()
        );
        for (verdict, count) in self.snapshot() {
            info!("   {verdict}: {count}");
        }
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}
