use thiserror::Error;

/// Failures at the request-decoding boundary. The sanitizer itself is total
/// and never produces one of these; they arise while buffering and parsing a
/// payload before it can be sanitized.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Failed to rebuild request URI: {0}")]
    QueryRebuild(String),
}
