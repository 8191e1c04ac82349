//! Application helpers used by the batch scanner.
//!
//! This module provides URL validation/normalization and progress logging.

pub mod logging;
pub mod url;

// Re-export public API
pub use logging::log_progress;
pub use url::{dedup_urls, normalize_target};
