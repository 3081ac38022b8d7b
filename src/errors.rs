use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for the retrieval pipeline.
///
/// Every failure from an external service is surfaced to the caller with its
/// kind and underlying message; the core never retries on its own. Callers
/// branch on the variant, never on message text.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no chunks to index")]
    EmptyInput,
    #[error("index has no entries")]
    EmptyIndex,
    #[error("no index available at {}", .0.display())]
    IndexNotFound(PathBuf),
    #[error("stored index is corrupt: {0}")]
    IndexCorrupt(String),
    #[error("embedding service error: {0}")]
    EmbeddingService(String),
    #[error("embedding mismatch: index was built with '{expected}' but queried with '{actual}'")]
    EmbeddingMismatch { expected: String, actual: String },
    #[error("generation service error: {0}")]
    GenerationService(String),
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
    #[error("storage error: {0}")]
    Storage(String),
}

impl RagError {
    pub fn storage<E: std::fmt::Display>(err: E) -> Self {
        RagError::Storage(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        RagError::EmbeddingService(err.to_string())
    }

    pub fn generation<E: std::fmt::Display>(err: E) -> Self {
        RagError::GenerationService(err.to_string())
    }
}
