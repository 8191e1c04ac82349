//! JSON HTTP controller for the batch scanner.
//!
//! Provides three endpoints:
//! - `POST /tls-checker/process-batch` - scan a list of URLs and store the verdicts
//! - `GET /tls-checker/scan-results` - latest stored result per URL
//! - `GET /tls-checker/urls-to-scan` - URLs discovered in the configured codebase

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;

use crate::scanner::BatchScanner;

use handlers::{process_batch_handler, scan_results_handler, urls_to_scan_handler};
pub use types::{ErrorResponse, ProcessBatchRequest, ProcessBatchResponse, UrlsToScanResponse};

/// Builds the router with the scanner as shared state.
pub fn router(scanner: Arc<BatchScanner>) -> Router {
    Router::new()
        .route("/tls-checker/process-batch", post(process_batch_handler))
        .route("/tls-checker/scan-results", get(scan_results_handler))
        .route("/tls-checker/urls-to-scan", get(urls_to_scan_handler))
        .with_state(scanner)
}

/// Binds `addr` and serves the API until Ctrl-C.
pub async fn start_server(addr: SocketAddr, scanner: Arc<BatchScanner>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {addr}"))?;

    log::info!("TLS checker listening on http://{addr}/");
    log::info!("  - Batch:   POST http://{addr}/tls-checker/process-batch");
    log::info!("  - Results: GET  http://{addr}/tls-checker/scan-results");
    log::info!("  - URLs:    GET  http://{addr}/tls-checker/urls-to-scan");

    axum::serve(listener, router(scanner))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::warn!("Failed to listen for Ctrl-C: {e}");
            }
            log::info!("Shutting down HTTP server");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
