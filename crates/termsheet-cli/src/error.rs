//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model service error
    #[error("Model service error: {0}")]
    Llm(#[from] termsheet_llm::LlmError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] termsheet_store::StoreError),

    /// Extraction error
    #[error("Extraction error: {0}")]
    Extractor(#[from] termsheet_extractor::ExtractorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No extraction with this id
    #[error("Extraction {0} not found")]
    NotFound(i64),

    /// Some documents in a batch failed
    #[error("{failed} of {total} document(s) failed")]
    BatchFailed {
        /// Failed documents
        failed: usize,
        /// Documents submitted
        total: usize,
    },
}
