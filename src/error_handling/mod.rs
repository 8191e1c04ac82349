//! Error handling and scan statistics.
//!
//! This module provides:
//! - Typed errors for initialization, configuration, database and fetch failures
//! - The persistence retry strategy
//! - Per-verdict statistics shared by the workers of a batch

mod stats;
mod types;

use std::time::Duration;

use tokio_retry::strategy::ExponentialBackoff;

pub use stats::ScanStats;
pub use types::{ConfigError, DatabaseError, FetchError, InitializationError};

/// Creates the retry strategy used for result persistence.
///
/// One retry after `STORE_RETRY_INITIAL_DELAY_MS` milliseconds; after that the
/// worker logs the failure and drops the result.
pub fn get_store_retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(crate::config::STORE_RETRY_INITIAL_DELAY_MS / 2)
        .max_delay(Duration::from_secs(2))
        .take(crate::config::STORE_RETRY_ATTEMPTS)
}
