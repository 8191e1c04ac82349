//! Endpoint handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, info};

use super::types::{ErrorResponse, ProcessBatchRequest, ProcessBatchResponse, UrlsToScanResponse};
use crate::config::NO_URLS_ERROR;
use crate::scanner::BatchScanner;

/// Decodes the URL list and runs the batch to completion.
///
/// Undecodable JSON, a missing or non-array `urls` field and an empty list all
/// get the same 400 response, and the scanner is not called.
pub async fn process_batch_handler(
    State(scanner): State<Arc<BatchScanner>>,
    body: Bytes,
) -> Response {
    let urls = match serde_json::from_slice::<ProcessBatchRequest>(&body) {
        Ok(request) if !request.urls.is_empty() => request.urls,
        Ok(_) => return bad_request(),
        Err(e) => {
            debug!("Rejecting batch request body: {e}");
            return bad_request();
        }
    };

    debug!("Batch request URLs: {urls:?}");
    let job = scanner.scan_and_store_urls(&urls).await;
    info!(
        "{} finished: {} processed, {} non-valid",
        job.batch_id, job.processed, job.failed
    );

    Json(ProcessBatchResponse {
        success: true,
        processed: urls.len(),
    })
    .into_response()
}

pub async fn scan_results_handler(State(scanner): State<Arc<BatchScanner>>) -> Response {
    match scanner.get_scan_results().await {
        Ok(results) => Json(results).into_response(),
        Err(e) => {
            error!("Failed to load scan results: {e}");
            internal_error("Failed to load scan results.")
        }
    }
}

pub async fn urls_to_scan_handler(State(scanner): State<Arc<BatchScanner>>) -> Response {
    match scanner.extract_urls_from_codebase().await {
        Ok(urls_to_scan) => Json(UrlsToScanResponse { urls_to_scan }).into_response(),
        Err(e) => {
            error!("URL extraction failed: {e:#}");
            internal_error("Failed to extract URLs from the codebase.")
        }
    }
}

fn bad_request() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(NO_URLS_ERROR)),
    )
        .into_response()
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message)),
    )
        .into_response()
}
