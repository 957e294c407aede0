//! Termsheet Extractor
//!
//! Turns a PDF contract into a validated [`ContractExtraction`] by delegating
//! document understanding to an external model service.
//!
//! # Overview
//!
//! The Extractor uploads the document, asks the model for a strictly
//! structured answer, and validates that answer against the extraction schema.
//! Failed attempts are retried up to a configured bound. The remote copy of
//! the document is released once the extraction reaches a terminal state.
//!
//! # Architecture
//!
//! ```text
//! PDF bytes → Extractor → ModelService → ContractExtraction → ExtractionStore → Artifact
//! ```
//!
//! # Key Features
//!
//! - **Bounded retries**: parse, validation and service failures are retried
//! - **Classified failures**: a terminal error names the last failure kind
//! - **Scoped remote handle**: released exactly once, on success or failure
//! - **Pipeline**: extraction, persistence, artifact and job log in one call
//!
//! # Example Usage
//!
//! ```no_run
//! use termsheet_extractor::{ArtifactWriter, Extractor, ExtractorConfig, Pipeline};
//! use termsheet_llm::MockModelService;
//! use termsheet_store::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = MockModelService::default();
//! let extractor = Extractor::new(service, ExtractorConfig::default());
//! let store = SqliteStore::open_in_memory()?;
//!
//! let pipeline = Pipeline::new(extractor, store)
//!     .with_artifacts(ArtifactWriter::new("outputs"));
//!
//! let bytes = std::fs::read("contract.pdf")?;
//! let submission = pipeline.submit(&bytes, "contract.pdf").await?;
//! println!("Stored as {}", submission.record_id());
//! # Ok(())
//! # }
//! ```
//!
//! [`ContractExtraction`]: termsheet_domain::ContractExtraction

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod pipeline;
mod prompt;
mod sink;


pub use config::ExtractorConfig;
pub use error::{ExtractorError, FailureKind};
pub use extractor::{is_supported_file, ExtractionReport, Extractor};
pub use pipeline::{Pipeline, Submission};
pub use prompt::{PromptLoader, Prompts};
pub use sink::{artifact_name, render_summary, ArtifactWriter};
