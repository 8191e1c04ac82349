//! Conversion between `ScanResult` and its column representation.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error_handling::DatabaseError;
use crate::models::{CertificateInfo, ScanResult, Verdict};

/// Columns selected by every read query, in this order.
pub(crate) const RESULT_COLUMNS: &str =
    "url, host, port, verdict, detail, certificate_json, scanned_at_ms";

/// Serializes the certificate column.
pub(crate) fn certificate_to_json(
    result: &ScanResult,
) -> Result<Option<String>, DatabaseError> {
    result
        .certificate
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DatabaseError::CorruptRow {
            url: result.url.clone(),
            reason: format!("certificate not serializable: {e}"),
        })
}

pub(crate) fn result_from_row(row: &SqliteRow) -> Result<ScanResult, DatabaseError> {
    let url: String = row.try_get("url")?;
    let corrupt = |reason: String| DatabaseError::CorruptRow {
        url: url.clone(),
        reason,
    };

    let verdict_text: String = row.try_get("verdict")?;
    let verdict = Verdict::from_str_opt(&verdict_text)
        .ok_or_else(|| corrupt(format!("unknown verdict {verdict_text}")))?;

    let port: i64 = row.try_get("port")?;
    let port = u16::try_from(port).map_err(|_| corrupt(format!("port {port} out of range")))?;

    let scanned_at_ms: i64 = row.try_get("scanned_at_ms")?;
    let scanned_at: DateTime<Utc> = DateTime::from_timestamp_millis(scanned_at_ms)
        .ok_or_else(|| corrupt(format!("timestamp {scanned_at_ms} out of range")))?;

    let certificate_json: Option<String> = row.try_get("certificate_json")?;
    let certificate = certificate_json
        .map(|json| serde_json::from_str::<CertificateInfo>(&json))
        .transpose()
        .map_err(|e| corrupt(format!("certificate column: {e}")))?;

    Ok(ScanResult {
        host: row.try_get("host")?,
        port,
        verdict,
        detail: row.try_get("detail")?,
        scanned_at,
        certificate,
        url,
    })
}
