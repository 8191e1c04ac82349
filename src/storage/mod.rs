// storage/mod.rs
// Result persistence

mod memory;
pub mod migrations;
pub mod pool;
mod row;
mod sqlite;
#[cfg(test)]
pub(crate) mod test_helpers;

use async_trait::async_trait;

use crate::error_handling::DatabaseError;
use crate::models::{BatchJob, ScanResult};

// Re-export commonly used items
pub use memory::MemoryResultStore;
pub use migrations::run_migrations;
pub use pool::init_db_pool_with_path;
pub use sqlite::SqliteResultStore;

/// Durable home of scan results, keyed by URL.
///
/// Implementations must be safe to call from many scan workers at once.
/// Writes for the same URL keep whichever result was scanned last; earlier
/// results stay available as history where the backend supports it.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Inserts or replaces the latest result for `result.url`.
    async fn upsert(&self, result: &ScanResult) -> Result<(), DatabaseError>;

    /// Returns the latest result of every URL, ordered by URL.
    async fn get_all(&self) -> Result<Vec<ScanResult>, DatabaseError>;

    async fn get_by_url(&self, url: &str) -> Result<Option<ScanResult>, DatabaseError>;

    /// Records the summary of a finished batch.
    async fn record_batch(&self, batch: &BatchJob) -> Result<(), DatabaseError>;
}
