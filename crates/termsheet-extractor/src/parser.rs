//! Parse model output into a validated extraction

use crate::error::FailureKind;
use serde_json::error::Category;
use termsheet_domain::ContractExtraction;

/// One failed attempt, before it is known whether another will follow
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttemptFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl AttemptFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Parse and validate model content
///
/// Syntax errors are parse failures. Content that is well-formed but has the
/// wrong shape (missing or unknown fields, unknown enum values, wrong types)
/// or breaks a field constraint is a validation failure.
pub(crate) fn parse_response(content: &str) -> Result<ContractExtraction, AttemptFailure> {
    let json = extract_json(content);
    if json.is_empty() {
        return Err(AttemptFailure::new(FailureKind::Parse, "Empty JSON document"));
    }

    let extraction: ContractExtraction = serde_json::from_str(json).map_err(|e| {
        let kind = match e.classify() {
            Category::Data => FailureKind::Validation,
            Category::Syntax | Category::Eof | Category::Io => FailureKind::Parse,
        };
        AttemptFailure::new(kind, e.to_string())
    })?;

    extraction
        .validate()
        .map_err(|e| AttemptFailure::new(FailureKind::Validation, e.to_string()))?;

    Ok(extraction)
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(body) = trimmed.strip_prefix("```") {
        // Skip the opening fence line (```json or ```) and the closing fence
        let body = body.split_once('\n').map_or("", |(_, rest)| rest);
        let body = body.trim_end();
        return body.strip_suffix("```").unwrap_or(body).trim();
    }

    trimmed
}
