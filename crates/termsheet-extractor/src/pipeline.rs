//! Request-scoped submission pipeline
//!
//! One submission runs extraction, persistence and the artifact write in
//! order, then appends a row to the job log. Submissions share nothing but
//! the store, so any number may run concurrently.

use crate::error::ExtractorError;
use crate::extractor::Extractor;
use crate::sink::ArtifactWriter;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use termsheet_domain::{
    content_hash, ContractExtraction, ExtractionStore, JobRecord, JobStatus, ModelService, RecordId,
};
use tracing::{info, warn};

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The document was extracted and stored
    Extracted {
        /// Identity of the new summary row
        record_id: RecordId,
        /// Content hash of the document
        file_hash: String,
        /// Model calls it took
        attempts: u32,
        /// Artifact path, when an artifact writer is configured
        artifact: Option<PathBuf>,
        /// The validated extraction
        extraction: Box<ContractExtraction>,
    },
    /// A document with the same content was already stored; the model was not called
    Duplicate {
        /// Identity of the most recent existing row
        record_id: RecordId,
        /// Content hash of the document
        file_hash: String,
    },
}

impl Submission {
    /// Identity of the stored extraction
    pub fn record_id(&self) -> RecordId {
        match self {
            Submission::Extracted { record_id, .. } | Submission::Duplicate { record_id, .. } => *record_id,
        }
    }

    /// Content hash of the submitted document
    pub fn file_hash(&self) -> &str {
        match self {
            Submission::Extracted { file_hash, .. } | Submission::Duplicate { file_hash, .. } => file_hash,
        }
    }

    /// Whether an earlier extraction was reused
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Submission::Duplicate { .. })
    }
}

/// Extraction, persistence and artifact output for one document at a time
pub struct Pipeline<M, S>
where
    M: ModelService,
    S: ExtractionStore,
{
    extractor: Extractor<M>,
    store: Arc<S>,
    artifacts: Option<ArtifactWriter>,
    skip_duplicates: bool,
    max_attempts: Option<u32>,
}

impl<M, S> Pipeline<M, S>
where
    M: ModelService + 'static,
    S: ExtractionStore,
{
    /// Create a pipeline that persists into `store`
    pub fn new(extractor: Extractor<M>, store: S) -> Self {
        Self::with_shared_store(extractor, Arc::new(store))
    }

    /// Create a pipeline over a store shared with other components
    pub fn with_shared_store(extractor: Extractor<M>, store: Arc<S>) -> Self {
        Self {
            extractor,
            store,
            artifacts: None,
            skip_duplicates: false,
            max_attempts: None,
        }
    }

    /// Write a JSON artifact for every stored extraction
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.artifacts = Some(writer);
        self
    }

    /// Return the existing record for a known content hash instead of extracting again
    pub fn skip_duplicates(mut self, skip: bool) -> Self {
        self.skip_duplicates = skip;
        self
    }

    /// Override the configured attempt budget
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submit one document
    pub async fn submit(&self, bytes: &[u8], filename: &str) -> Result<Submission, ExtractorError> {
        let started_at = Utc::now();
        let file_hash = content_hash(bytes);

        if self.skip_duplicates {
            let existing = self.store.find_by_hash(&file_hash).map_err(persistence)?;
            if let Some(record_id) = existing {
                info!(filename, %record_id, file_hash = %file_hash, "Skipping known document");
                return Ok(Submission::Duplicate { record_id, file_hash });
            }
        }

        let report = self.extractor.run(bytes, filename, self.max_attempts).await;

        let mut stored_id = None;
        let result = match report.result {
            Err(e) => Err(e),
            Ok(extraction) => match self.store.persist(&extraction, filename, bytes) {
                Err(e) => Err(persistence(e)),
                Ok(record_id) => {
                    stored_id = Some(record_id);
                    self.write_artifact(record_id, filename, &extraction)
                        .map(|artifact| Submission::Extracted {
                            record_id,
                            file_hash: file_hash.clone(),
                            attempts: report.attempts,
                            artifact,
                            extraction: Box::new(extraction),
                        })
                }
            },
        };

        self.record_job(JobRecord {
            file_name: filename.to_string(),
            file_size: bytes.len() as u64,
            file_hash,
            status: if result.is_ok() {
                JobStatus::Completed
            } else {
                JobStatus::Failed
            },
            error_message: result.as_ref().err().map(ToString::to_string),
            started_at,
            finished_at: Utc::now(),
            attempts: report.attempts,
            remote_file_id: report.document.map(|handle| handle.id().to_string()),
            model: self.extractor.config().model.clone(),
            extraction_id: stored_id,
        });

        result
    }

    fn write_artifact(
        &self,
        record_id: RecordId,
        filename: &str,
        extraction: &ContractExtraction,
    ) -> Result<Option<PathBuf>, ExtractorError> {
        self.artifacts
            .as_ref()
            .map(|writer| writer.write(record_id, filename, extraction))
            .transpose()
    }

    fn record_job(&self, job: JobRecord) {
        if let Err(e) = self.store.record_job(&job) {
            warn!(filename = %job.file_name, "Failed to record extraction job: {}", e);
        }
    }
}

fn persistence<E>(e: E) -> ExtractorError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ExtractorError::Persistence(Box::new(e))
}
