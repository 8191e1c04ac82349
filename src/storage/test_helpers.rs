//! Shared test helpers for storage module tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;

use crate::models::{CertificateInfo, ChainTrust, ScanResult, Verdict};
use crate::storage::{run_migrations, SqliteResultStore};

/// Creates a store over an in-memory database with migrations applied.
///
/// A single connection is used because every `:memory:` connection opens its
/// own private database.
pub async fn create_test_store() -> SqliteResultStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    SqliteResultStore::new(Arc::new(pool))
}

/// Fixed, millisecond-precision timestamp so rows compare equal after a round trip.
pub fn fixed_time() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_735_732_800_123)
        .single()
        .expect("valid timestamp")
}

pub fn sample_result(url: &str, verdict: Verdict) -> ScanResult {
    ScanResult {
        url: url.to_string(),
        host: url.trim_start_matches("https://").to_string(),
        port: 443,
        verdict,
        detail: format!("{verdict} detail"),
        scanned_at: fixed_time(),
        certificate: None,
    }
}

pub fn sample_certificate() -> CertificateInfo {
    CertificateInfo {
        subject: "CN=example.com".to_string(),
        issuer: "CN=Example CA".to_string(),
        serial_number: "01:02:03".to_string(),
        not_before: fixed_time() - chrono::Duration::days(10),
        not_after: fixed_time() + chrono::Duration::days(80),
        subject_alternative_names: vec!["example.com".to_string(), "*.example.com".to_string()],
        common_name: Some("example.com".to_string()),
        signature_algorithm: "ecdsa-with-SHA256".to_string(),
        chain_length: 2,
        tls_version: "TLSv1_3".to_string(),
        cipher_suite: "TLS13_AES_128_GCM_SHA256".to_string(),
        chain_trust: ChainTrust::Trusted,
    }
}
