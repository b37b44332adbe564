//! Error types for collaborators, detection layers and configuration.
//!
//! None of these ever escape the classification/matching/synthesis stages:
//! those stages log and skip. They surface only at the collaborator seams
//! and when loading configuration.

/// Failure of an external collaborator (data source, snapshot source, ranker).
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{collaborator} timed out after {after_ms} ms")]
    Timeout { collaborator: String, after_ms: u64 },

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Run budget exhausted before calling {0}")]
    BudgetExhausted(String),
}

/// Failure inside a single UI detection layer.
#[derive(thiserror::Error, Debug)]
pub enum LayerError {
    #[error("{layer}: invalid selector pattern `{pattern}`")]
    InvalidPattern { layer: &'static str, pattern: String },

    #[error("{layer}: malformed markup: {reason}")]
    Malformed { layer: &'static str, reason: String },
}

/// Invalid learner configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Convenience result type for collaborator calls.
pub type SourceResult<T> = Result<T, SourceError>;
