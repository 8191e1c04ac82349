//! SQLite-backed result store.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use sqlx::{Pool, Sqlite};

use super::row::{certificate_to_json, result_from_row, RESULT_COLUMNS};
use super::{init_db_pool_with_path, run_migrations, ResultStore};
use crate::error_handling::DatabaseError;
use crate::models::{BatchJob, ScanResult};

/// Stores the latest result per URL in `scan_results` and appends every
/// write to `scan_history`.
#[derive(Clone)]
pub struct SqliteResultStore {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteResultStore {
    /// Wraps an existing pool. Migrations must already have been applied.
    pub fn new(pool: Arc<Pool<Sqlite>>) -> Self {
        Self { pool }
    }

    /// Opens (or creates) the database at `db_path` and applies migrations.
    pub async fn open(db_path: &std::path::Path) -> Result<Self, DatabaseError> {
        let pool = init_db_pool_with_path(db_path).await?;
        run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Every stored result for `url`, oldest first.
    pub async fn history(&self, url: &str) -> Result<Vec<ScanResult>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} FROM scan_history WHERE url = ? ORDER BY scanned_at_ms, id"
        ))
        .bind(url)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(result_from_row).collect()
    }

    /// Ids of every recorded batch, oldest first.
    pub async fn batch_ids(&self) -> Result<Vec<String>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT batch_id FROM scan_batches ORDER BY started_at_ms, batch_id",
        )
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(ids)
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn upsert(&self, result: &ScanResult) -> Result<(), DatabaseError> {
        let certificate_json = certificate_to_json(result)?;
        let scanned_at_ms = result.scanned_at.timestamp_millis();

        let mut tx = self.pool.begin().await?;

        // An older result never overwrites a newer one
        sqlx::query(
            "INSERT INTO scan_results (url, host, port, verdict, detail, certificate_json, scanned_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(url) DO UPDATE SET
                 host=excluded.host,
                 port=excluded.port,
                 verdict=excluded.verdict,
                 detail=excluded.detail,
                 certificate_json=excluded.certificate_json,
                 scanned_at_ms=excluded.scanned_at_ms
             WHERE excluded.scanned_at_ms >= scan_results.scanned_at_ms",
        )
        .bind(&result.url)
        .bind(&result.host)
        .bind(i64::from(result.port))
        .bind(result.verdict.as_str())
        .bind(&result.detail)
        .bind(certificate_json.as_deref())
        .bind(scanned_at_ms)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO scan_history (url, host, port, verdict, detail, certificate_json, scanned_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&result.url)
        .bind(&result.host)
        .bind(i64::from(result.port))
        .bind(result.verdict.as_str())
        .bind(&result.detail)
        .bind(certificate_json.as_deref())
        .bind(scanned_at_ms)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Stored {} result for {}", result.verdict, result.url);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<ScanResult>, DatabaseError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} FROM scan_results ORDER BY url"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(result_from_row).collect()
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<ScanResult>, DatabaseError> {
        let row = sqlx::query(&format!(
            "SELECT {RESULT_COLUMNS} FROM scan_results WHERE url = ?"
        ))
        .bind(url)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.as_ref().map(result_from_row).transpose()
    }

    async fn record_batch(&self, batch: &BatchJob) -> Result<(), DatabaseError> {
        let verdict_counts =
            serde_json::to_string(&batch.verdict_counts).map_err(|e| DatabaseError::CorruptRow {
                url: batch.batch_id.clone(),
                reason: format!("verdict counts not serializable: {e}"),
            })?;

        sqlx::query(
            "INSERT INTO scan_batches (batch_id, total, processed, failed, persist_failures,
                                       verdict_counts_json, started_at_ms, finished_at_ms)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(batch_id) DO UPDATE SET
                 total=excluded.total,
                 processed=excluded.processed,
                 failed=excluded.failed,
                 persist_failures=excluded.persist_failures,
                 verdict_counts_json=excluded.verdict_counts_json,
                 finished_at_ms=excluded.finished_at_ms",
        )
        .bind(&batch.batch_id)
        .bind(batch.total as i64)
        .bind(batch.processed as i64)
        .bind(batch.failed as i64)
        .bind(batch.persist_failures as i64)
        .bind(verdict_counts)
        .bind(batch.started_at.timestamp_millis())
        .bind(batch.finished_at.map(|t| t.timestamp_millis()))
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }
}
