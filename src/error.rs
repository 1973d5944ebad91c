//! # Interpreter Errors
//!
//! Document-level failures. Per-node and per-link problems never surface here;
//! those records are skipped and the pass continues.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph document must be a JSON object")]
    NotAnObject,
    #[error("graph document is missing the '{0}' array")]
    MissingArray(&'static str),
    #[error("API format document must be a JSON object keyed by node id")]
    ApiFormatNotAnObject,
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraphError>;
