//! In-memory result store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ResultStore;
use crate::error_handling::DatabaseError;
use crate::models::{BatchJob, ScanResult};

/// Keeps the latest result per URL in an ordered map.
///
/// Nothing survives the process; used by tests and by embedders that do not
/// want a database file.
#[derive(Default)]
pub struct MemoryResultStore {
    results: RwLock<BTreeMap<String, ScanResult>>,
    batches: RwLock<Vec<BatchJob>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batch summaries recorded so far, oldest first.
    pub async fn batches(&self) -> Vec<BatchJob> {
        self.batches.read().await.clone()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn upsert(&self, result: &ScanResult) -> Result<(), DatabaseError> {
        let mut results = self.results.write().await;
        match results.get(&result.url) {
            Some(existing) if existing.scanned_at > result.scanned_at => {}
            _ => {
                results.insert(result.url.clone(), result.clone());
            }
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ScanResult>, DatabaseError> {
        Ok(self.results.read().await.values().cloned().collect())
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<ScanResult>, DatabaseError> {
        Ok(self.results.read().await.get(url).cloned())
    }

    async fn record_batch(&self, batch: &BatchJob) -> Result<(), DatabaseError> {
        self.batches.write().await.push(batch.clone());
        Ok(())
    }
}
