//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{ContractExtraction, RecordId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque reference to a document registered with a model service
///
/// Holding a handle carries an obligation: it must be released once the
/// extraction that uploaded it reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    /// Wrap a service-issued identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The service-issued identifier
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One structured completion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// System instruction text
    pub system_prompt: String,
    /// User instruction text
    pub user_prompt: String,
    /// The uploaded document the instructions refer to
    pub document: DocumentHandle,
    /// Structured-output contract the response must satisfy
    pub response_format: Value,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
}

/// Trait for an external document-understanding model
///
/// Implemented by the infrastructure layer (termsheet-llm)
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Error type for service operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Register a document and obtain a handle to it
    async fn upload_document(&self, filename: &str, bytes: &[u8]) -> Result<DocumentHandle, Self::Error>;

    /// Issue one structured completion
    ///
    /// `Ok(None)` means the service answered without any content.
    async fn complete_structured(&self, request: &CompletionRequest) -> Result<Option<String>, Self::Error>;

    /// Release a previously uploaded document
    async fn release_document(&self, handle: &DocumentHandle) -> Result<(), Self::Error>;
}

/// Outcome of one submission as recorded in the job log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
}

impl JobStatus {
    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Audit record of one submission, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub file_name: String,
    pub file_size: u64,
    pub file_hash: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Model calls issued (zero when the submission failed a precondition)
    pub attempts: u32,
    pub remote_file_id: Option<String>,
    pub model: String,
    /// Set whenever the extraction was persisted
    pub extraction_id: Option<RecordId>,
}

impl JobRecord {
    /// Wall-clock processing time in seconds
    pub fn processing_seconds(&self) -> f64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as f64
            / 1000.0
    }
}

/// Trait for durably storing extractions
///
/// Implemented by the infrastructure layer (termsheet-store)
pub trait ExtractionStore: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a validated extraction atomically and return its identity
    fn persist(
        &self,
        extraction: &ContractExtraction,
        filename: &str,
        bytes: &[u8],
    ) -> Result<RecordId, Self::Error>;

    /// Most recent extraction with the given content hash
    fn find_by_hash(&self, hash: &str) -> Result<Option<RecordId>, Self::Error>;

    /// Append a job record, outside any extraction transaction
    fn record_job(&self, job: &JobRecord) -> Result<i64, Self::Error>;
}
