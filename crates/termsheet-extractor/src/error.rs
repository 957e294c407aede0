//! Error types for the Extractor

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Classification of a failed model attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The content was not well-formed JSON
    Parse,
    /// Well-formed JSON that does not satisfy the extraction schema
    Validation,
    /// Anything else, including timeouts, empty answers and rejected requests
    Service,
}

impl FailureKind {
    /// Lowercase label used in messages and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Parse => "parse",
            FailureKind::Validation => "validation",
            FailureKind::Service => "service",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The document is not a PDF
    #[error("Unsupported file: {0} (only PDF files are supported)")]
    UnsupportedFile(String),

    /// A prompt file could not be read
    #[error("Prompt file unavailable: {}", path.display())]
    PromptUnavailable {
        /// Path that was tried
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A zero attempt budget was requested
    #[error("max_attempts must be at least 1")]
    InvalidAttempts,

    /// The document could not be registered with the model service
    #[error("Document upload failed: {0}")]
    Upload(String),

    /// Every attempt failed; carries the last failure
    #[error("Extraction failed after {attempts} attempt(s) with {kind} failure: {message}")]
    Terminal {
        /// Kind of the last failure
        kind: FailureKind,
        /// Attempts issued
        attempts: u32,
        /// Message of the last failure
        message: String,
    },

    /// The validated extraction could not be stored
    #[error("Persistence error: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The output artifact could not be written
    #[error("Failed to write artifact {}: {source}", path.display())]
    Artifact {
        /// Target path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(String),
}

impl ExtractorError {
    /// Whether the error was raised before any model call was made
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ExtractorError::UnsupportedFile(_)
                | ExtractorError::PromptUnavailable { .. }
                | ExtractorError::InvalidAttempts
        )
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_message_names_kind_and_attempts() {
        let err = ExtractorError::Terminal {
            kind: FailureKind::Validation,
            attempts: 3,
            message: "missing field `fees`".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempt(s)"));
        assert!(text.contains("validation failure"));
        assert!(text.contains("missing field `fees`"));
    }

    #[test]
    fn test_precondition_classification() {
        assert!(ExtractorError::UnsupportedFile("a.docx".into()).is_precondition());
        assert!(ExtractorError::InvalidAttempts.is_precondition());
        assert!(!ExtractorError::Upload("boom".into()).is_precondition());
    }
}
