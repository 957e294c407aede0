//! Result sink: JSON artifacts and human-readable summaries

use crate::error::ExtractorError;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use termsheet_domain::{ContractExtraction, RecordId};
use tracing::info;

/// Artifact file name for a persisted extraction
///
/// Combines the record id with the source filename stem.
///
/// ```
/// use termsheet_domain::RecordId;
/// use termsheet_extractor::artifact_name;
///
/// let name = artifact_name(RecordId::from_value(42), "uploads/Master Agreement.PDF");
/// assert_eq!(name, "42_Master Agreement_extraction.json");
/// ```
pub fn artifact_name(id: RecordId, filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{}_{}_extraction.json", id, stem)
}

/// Writes one pretty-printed JSON file per persisted extraction
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer rooted at the given directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory artifacts are written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the artifact, creating the output directory if needed
    pub fn write(
        &self,
        id: RecordId,
        filename: &str,
        extraction: &ContractExtraction,
    ) -> Result<PathBuf, ExtractorError> {
        let path = self.output_dir.join(artifact_name(id, filename));
        let json = serde_json::to_string_pretty(extraction)?;

        fs::create_dir_all(&self.output_dir)
            .and_then(|()| fs::write(&path, json))
            .map_err(|source| ExtractorError::Artifact {
                path: path.clone(),
                source,
            })?;

        info!(record_id = %id, path = %path.display(), "Wrote extraction artifact");
        Ok(path)
    }
}

/// Human-readable overview of an extraction
pub fn render_summary(extraction: &ContractExtraction) -> String {
    let metadata = &extraction.contract_metadata;
    let terms = &extraction.financial_terms;
    let quality = &extraction.extraction_metadata;

    let mut out = String::new();
    let rule = "=".repeat(60);
    // Writing to a String cannot fail
    let _ = writeln!(out, "{rule}\nEXTRACTION SUMMARY\n{rule}");
    let _ = writeln!(out, "Document: {}", metadata.document_title);
    let _ = writeln!(out, "Type: {}", metadata.contract_type);
    let _ = writeln!(out, "Period: {} to {}", or_unknown(&metadata.effective_date), or_unknown(&metadata.end_date));
    let _ = writeln!(out, "Parties: {} entities", metadata.parties.len());

    let _ = writeln!(out, "\nFINANCIAL COMPONENTS:");
    let _ = writeln!(out, "  - Base Compensation: {} items", terms.base_compensation.len());
    let _ = writeln!(out, "  - Royalties: {} items", terms.royalties.len());
    let _ = writeln!(out, "  - Fees: {} items", terms.fees.len());
    let _ = writeln!(out, "  - Equity: {} items", terms.equity_compensation.len());
    let _ = writeln!(out, "  - Expenses: {} items", terms.expenses.len());
    let _ = writeln!(out, "  - Pricing Rules: {} rules", extraction.pricing_rules.rules.len());

    let _ = writeln!(out, "\nQUALITY METRICS:");
    let _ = writeln!(out, "  - Overall Confidence: {:.1}%", quality.overall_confidence * 100.0);
    let _ = writeln!(out, "  - Redacted Fields: {}", quality.redacted_fields_count);
    let _ = writeln!(out, "  - Warnings: {}", quality.processing_warnings.len());
    if !quality.extraction_notes.is_empty() {
        let _ = writeln!(out, "  - Notes: {}", quality.extraction_notes);
    }

    out
}

fn or_unknown(text: &str) -> &str {
    if text.is_empty() {
        "?"
    } else {
        text
    }
}
