//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Logs progress information about a running batch.
///
/// # Arguments
///
/// * `batch_id` - Identifier of the batch being scanned
/// * `start_time` - The start time of the batch
/// * `completed` - Atomic counter of targets that produced a result
/// * `total` - Number of targets in the batch
pub fn log_progress(
    batch_id: &str,
    start_time: std::time::Instant,
    completed: &AtomicUsize,
    total: usize,
) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let completed = completed.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        completed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Batch {batch_id}: {completed}/{total} targets in {elapsed_secs:.2} seconds (~{rate:.2} targets/sec)"
    );
}
