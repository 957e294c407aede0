//! Termsheet Model Service Layer
//!
//! Implementations of the `ModelService` trait from `termsheet-domain`.
//!
//! # Services
//!
//! - `MockModelService`: Scripted, deterministic service for testing
//! - `OpenAiService`: OpenAI files + chat completions API
//!
//! # Examples
//!
//! ```
//! use termsheet_llm::{MockModelService, ScriptedResponse};
//!
//! let service = MockModelService::new("{}");
//! service.push_response(ScriptedResponse::Empty);
//! assert_eq!(service.complete_count(), 0);
//! ```

#![warn(missing_docs)]

pub mod openai;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use termsheet_domain::{CompletionRequest, DocumentHandle, ModelService};
use thiserror::Error;

pub use openai::OpenAiService;

/// Errors that can occur during model service operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model or resource not available
    #[error("Not available: {0}")]
    ModelNotAvailable(String),

    /// The model declined to answer
    #[error("Model refused the request: {0}")]
    Refused(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// What the mock answers to one completion call
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedResponse {
    /// Return this content
    Content(String),
    /// Answer without content
    Empty,
    /// Fail the call with this message
    Failure(String),
}

/// Mock model service for deterministic testing
///
/// Completion calls consume scripted responses in order; once the script is
/// exhausted every call returns the default content. Clones share counters
/// and script.
///
/// # Examples
///
/// ```
/// use termsheet_llm::{MockModelService, ScriptedResponse};
///
/// let service = MockModelService::new("final")
///     .with_script([ScriptedResponse::Failure("boom".into())]);
/// assert_eq!(service.upload_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockModelService {
    default_content: String,
    script: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    uploaded: Arc<Mutex<Vec<String>>>,
    released: Arc<Mutex<Vec<DocumentHandle>>>,
    upload_count: Arc<Mutex<usize>>,
    release_count: Arc<Mutex<usize>>,
    fail_upload: bool,
    fail_release: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockModelService {
    /// Create a mock that answers every completion with `content`
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            default_content: content.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            uploaded: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(Mutex::new(Vec::new())),
            upload_count: Arc::new(Mutex::new(0)),
            release_count: Arc::new(Mutex::new(0)),
            fail_upload: false,
            fail_release: false,
        }
    }

    /// Queue scripted responses ahead of the default content
    pub fn with_script(self, responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        lock(&self.script).extend(responses);
        self
    }

    /// Make every upload fail
    pub fn with_upload_failure(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    /// Make every release fail (the call is still counted)
    pub fn with_release_failure(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Queue one more scripted response
    pub fn push_response(&self, response: ScriptedResponse) {
        lock(&self.script).push_back(response);
    }

    /// Number of upload calls
    pub fn upload_count(&self) -> usize {
        *lock(&self.upload_count)
    }

    /// Number of completion calls
    pub fn complete_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Number of release calls
    pub fn release_count(&self) -> usize {
        *lock(&self.release_count)
    }

    /// Filenames passed to upload, in call order
    pub fn uploaded_filenames(&self) -> Vec<String> {
        lock(&self.uploaded).clone()
    }

    /// Handles successfully released, in call order
    pub fn released_handles(&self) -> Vec<DocumentHandle> {
        lock(&self.released).clone()
    }

    /// The most recent completion request
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl Default for MockModelService {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ModelService for MockModelService {
    type Error = LlmError;

    async fn upload_document(&self, filename: &str, _bytes: &[u8]) -> Result<DocumentHandle, Self::Error> {
        let n = {
            let mut count = lock(&self.upload_count);
            *count += 1;
            *count
        };

        if self.fail_upload {
            return Err(LlmError::Communication("Mock upload failure".to_string()));
        }

        lock(&self.uploaded).push(filename.to_string());
        Ok(DocumentHandle::new(format!("mock-file-{}", n)))
    }

    async fn complete_structured(&self, request: &CompletionRequest) -> Result<Option<String>, Self::Error> {
        lock(&self.requests).push(request.clone());

        let next = lock(&self.script).pop_front();
        match next {
            Some(ScriptedResponse::Content(content)) => Ok(Some(content)),
            Some(ScriptedResponse::Empty) => Ok(None),
            Some(ScriptedResponse::Failure(message)) => Err(LlmError::Other(message)),
            None => Ok(Some(self.default_content.clone())),
        }
    }

    async fn release_document(&self, handle: &DocumentHandle) -> Result<(), Self::Error> {
        *lock(&self.release_count) += 1;

        if self.fail_release {
            return Err(LlmError::Communication("Mock release failure".to_string()));
        }

        lock(&self.released).push(handle.clone());
        Ok(())
    }
}
