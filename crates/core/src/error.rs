//! Error types for the voyager pipeline.
//!
//! This module defines a unified error enum covering the whole error
//! taxonomy of the application: configuration, corpus ingestion,
//! embedding, indexing, anomaly screening, and answer generation.
//!
//! Note that an off-topic classification is *not* an error; it is a
//! normal pipeline outcome and is modeled in the pipeline crate.

use thiserror::Error;

/// Unified error type for the voyager pipeline.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Fatal configuration errors: missing API credential, invalid
    /// settings, embedding/index dimensionality disagreement at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The corpus source path/file is missing or unreadable.
    /// Fatal to the build step only; a previously persisted index
    /// keeps serving queries.
    #[error("Corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// The anomaly screener was asked to fit against an empty
    /// embedding set.
    #[error("Insufficient training data: {0}")]
    InsufficientTrainingData(String),

    /// The query embedding does not match the dimensionality of the
    /// corpus embeddings. This is a configuration error (wrong model
    /// wired in), surfaced eagerly instead of as a numeric fault.
    #[error("Embedding model mismatch: expected {expected} dimensions, got {actual}")]
    EmbeddingModelMismatch { expected: usize, actual: usize },

    /// The user submitted an empty/blank query. Recovered locally;
    /// the caller prompts for re-entry.
    #[error("Empty query")]
    EmptyQuery,

    /// Embedding provider errors (connection, bad response, etc.)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index storage errors
    #[error("Index error: {0}")]
    Index(String),

    /// Text-generation capability errors (network/API faults from the
    /// LLM service).
    #[error("Generation error: {0}")]
    Generation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_both_dimensions() {
        let err = AppError::EmbeddingModelMismatch {
            expected: 768,
            actual: 384,
        };
        let msg = err.to_string();
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
