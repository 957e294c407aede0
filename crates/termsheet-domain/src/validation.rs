//! Semantic validation of contract extractions
//!
//! Deserialization already enforces the shape (required fields, no unknown
//! fields, closed enums). The checks here cover constraints the shape cannot
//! express.

use crate::extraction::ContractExtraction;
use thiserror::Error;

/// A validated extraction violated one or more field constraints
#[derive(Debug, Clone, PartialEq, Error)]
#[error("extraction failed validation: {}", issues.join("; "))]
pub struct ValidationError {
    /// Every violated constraint, as a path-prefixed message
    pub issues: Vec<String>,
}

impl ContractExtraction {
    /// Check field constraints beyond plain JSON typing
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let confidence = self.extraction_metadata.overall_confidence;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            issues.push(format!(
                "extraction_metadata.overall_confidence {} out of range [0.0, 1.0]",
                confidence
            ));
        }

        if self.extraction_metadata.redacted_fields_count < 0 {
            issues.push(format!(
                "extraction_metadata.redacted_fields_count must be >= 0, got {}",
                self.extraction_metadata.redacted_fields_count
            ));
        }

        if self.contract_metadata.total_pages < 0 {
            issues.push(format!(
                "contract_metadata.total_pages must be >= 0, got {}",
                self.contract_metadata.total_pages
            ));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}
