//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /tls-checker/process-batch`.
#[derive(Debug, Deserialize)]
pub struct ProcessBatchRequest {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessBatchResponse {
    pub success: bool,
    /// Number of URLs in the request, duplicates included
    pub processed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlsToScanResponse {
    pub urls_to_scan: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
