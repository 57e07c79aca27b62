//! Error types for quakemap.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Message shown to the viewer whenever a poll cycle fails.
///
/// The underlying cause is logged, never displayed.
pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch earthquake data";

/// Errors that can occur while fetching the earthquake feed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (connect, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Feed returned a non-success status
    #[error("USGS feed error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid response structure
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
