//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, FailureKind};
use crate::parser::{parse_response, AttemptFailure};
use crate::prompt::PromptLoader;
use std::path::Path;
use std::sync::Arc;
use termsheet_domain::schema::response_format;
use termsheet_domain::{CompletionRequest, ContractExtraction, DocumentHandle, ModelService};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Whether the filename carries a `.pdf` extension, in any case
pub fn is_supported_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Everything known about one extraction run
#[derive(Debug)]
pub struct ExtractionReport {
    /// The validated extraction, or why there is none
    pub result: Result<ContractExtraction, ExtractorError>,
    /// Model calls issued
    pub attempts: u32,
    /// Remote handle the document was registered under, if the upload succeeded
    pub document: Option<DocumentHandle>,
}

/// The Extractor turns a PDF contract into a validated extraction
pub struct Extractor<M>
where
    M: ModelService,
{
    service: Arc<M>,
    config: ExtractorConfig,
}

impl<M> Extractor<M>
where
    M: ModelService + 'static,
{
    /// Create a new Extractor
    pub fn new(service: M, config: ExtractorConfig) -> Self {
        Self::with_shared_service(Arc::new(service), config)
    }

    /// Create an Extractor over a service shared with other components
    pub fn with_shared_service(service: Arc<M>, config: ExtractorConfig) -> Self {
        Self { service, config }
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a contract, returning only the outcome
    ///
    /// `max_attempts` overrides the configured attempt budget.
    pub async fn extract(
        &self,
        bytes: &[u8],
        filename: &str,
        max_attempts: Option<u32>,
    ) -> Result<ContractExtraction, ExtractorError> {
        self.run(bytes, filename, max_attempts).await.result
    }

    /// Extract a contract, reporting attempts and the remote handle as well
    pub async fn run(&self, bytes: &[u8], filename: &str, max_attempts: Option<u32>) -> ExtractionReport {
        let mut attempts = 0;
        let mut document = None;
        let result = self
            .run_inner(bytes, filename, max_attempts, &mut attempts, &mut document)
            .await;
        ExtractionReport {
            result,
            attempts,
            document,
        }
    }

    async fn run_inner(
        &self,
        bytes: &[u8],
        filename: &str,
        max_attempts: Option<u32>,
        attempts: &mut u32,
        document: &mut Option<DocumentHandle>,
    ) -> Result<ContractExtraction, ExtractorError> {
        if !is_supported_file(filename) {
            return Err(ExtractorError::UnsupportedFile(filename.to_string()));
        }

        let max_attempts = max_attempts.unwrap_or(self.config.max_attempts);
        if max_attempts == 0 {
            return Err(ExtractorError::InvalidAttempts);
        }

        let prompts = PromptLoader::new(&self.config.system_prompt_path, &self.config.user_prompt_path).load()?;
        let response_format = response_format()?;

        info!(filename, size = bytes.len(), max_attempts, "Starting extraction");

        let handle = self
            .service
            .upload_document(filename, bytes)
            .await
            .map_err(|e| ExtractorError::Upload(e.to_string()))?;
        debug!(filename, document = %handle, "Document uploaded");
        *document = Some(handle.clone());

        let remote = RemoteDocument::new(Arc::clone(&self.service), handle.clone());

        let request = CompletionRequest {
            model: self.config.model.clone(),
            system_prompt: prompts.system,
            user_prompt: prompts.user,
            document: handle,
            response_format,
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
        };

        let outcome = self.attempt_loop(&request, filename, max_attempts, attempts).await;
        remote.release().await;
        outcome
    }

    async fn attempt_loop(
        &self,
        request: &CompletionRequest,
        filename: &str,
        max_attempts: u32,
        attempts: &mut u32,
    ) -> Result<ContractExtraction, ExtractorError> {
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            let delay = self.config.backoff_before(attempt);
            if !delay.is_zero() {
                sleep(delay).await;
            }

            *attempts = attempt;
            match self.attempt(request).await {
                Ok(extraction) => {
                    info!(
                        filename,
                        attempt,
                        fees = extraction.financial_terms.fees.len(),
                        confidence = extraction.extraction_metadata.overall_confidence,
                        "Extraction succeeded"
                    );
                    return Ok(extraction);
                }
                Err(failure) => {
                    warn!(
                        filename,
                        attempt,
                        max_attempts,
                        kind = %failure.kind,
                        "Extraction attempt failed: {}",
                        failure.message
                    );
                    last_failure = Some(failure);
                }
            }
        }

        let failure = last_failure
            .unwrap_or_else(|| AttemptFailure::new(FailureKind::Service, "no attempt was made"));
        Err(ExtractorError::Terminal {
            kind: failure.kind,
            attempts: max_attempts,
            message: failure.message,
        })
    }

    /// One model call, classified
    async fn attempt(&self, request: &CompletionRequest) -> Result<ContractExtraction, AttemptFailure> {
        let content = timeout(self.config.call_timeout(), self.service.complete_structured(request))
            .await
            .map_err(|_| {
                AttemptFailure::new(
                    FailureKind::Service,
                    format!("model call timed out after {}s", self.config.call_timeout_secs),
                )
            })?
            .map_err(|e| AttemptFailure::new(FailureKind::Service, e.to_string()))?
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AttemptFailure::new(FailureKind::Service, "model returned empty content"))?;

        debug!(chars = content.len(), "Model response received");
        parse_response(&content)
    }
}

/// A document registered with the model service that must be released
///
/// `release` is the normal path. If the guard is dropped unreleased (the
/// caller stopped waiting), release is attempted on a spawned task.
struct RemoteDocument<M: ModelService + 'static> {
    service: Arc<M>,
    handle: Option<DocumentHandle>,
}

impl<M: ModelService + 'static> RemoteDocument<M> {
    fn new(service: Arc<M>, handle: DocumentHandle) -> Self {
        Self {
            service,
            handle: Some(handle),
        }
    }

    async fn release(mut self) {
        if let Some(handle) = self.handle.take() {
            release_logged(self.service.as_ref(), &handle).await;
        }
    }
}

impl<M: ModelService + 'static> Drop for RemoteDocument<M> {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let service = Arc::clone(&self.service);
                runtime.spawn(async move {
                    release_logged(service.as_ref(), &handle).await;
                });
            }
            Err(_) => warn!(document = %handle, "No runtime available, remote document not released"),
        }
    }
}

async fn release_logged<M: ModelService>(service: &M, handle: &DocumentHandle) {
    match service.release_document(handle).await {
        Ok(()) => debug!(document = %handle, "Released remote document"),
        Err(e) => warn!(document = %handle, "Failed to release remote document: {}", e),
    }
}
