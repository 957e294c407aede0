//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use termsheet_store::{ContractTypeSummary, ExtractionRecord, ExtractionSummary, JobStats};

/// Outcome of one document in a batch, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// File as given on the command line
    pub file: String,
    /// Stored record id, on success
    pub record_id: Option<i64>,
    /// Whether an earlier extraction was reused
    pub duplicate: bool,
    /// Model calls used
    pub attempts: u32,
    /// Artifact path, on success
    pub artifact: Option<String>,
    /// Error text, on failure
    pub error: Option<String>,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a page of extraction summaries.
    pub fn format_summaries(&self, summaries: &[ExtractionSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summaries)?),
            OutputFormat::Quiet => Ok(summaries
                .iter()
                .map(|s| s.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if summaries.is_empty() {
                    return Ok(self.colorize("No extractions found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Title", "Type", "Confidence", "Fees", "Rules", "File", "Created"]);
                for summary in summaries {
                    builder.push_record([
                        summary.id.to_string(),
                        truncate(&summary.document_title, 40),
                        summary.contract_type.clone(),
                        format!("{:.2}", summary.overall_confidence),
                        summary.total_fees_count.to_string(),
                        summary.total_pricing_rules_count.to_string(),
                        summary.source_file_name.clone(),
                        summary.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    ]);
                }
                Ok(self.styled(builder))
            }
        }
    }

    /// Format one stored extraction.
    pub fn format_record(&self, record: &ExtractionRecord) -> Result<String> {
        let summary = &record.summary;
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
            OutputFormat::Quiet => Ok(summary.id.to_string()),
            OutputFormat::Table => {
                let c = &summary.characteristics;
                let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());

                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                let rows = [
                    ("ID", summary.id.to_string()),
                    ("Title", summary.document_title.clone()),
                    ("Type", summary.contract_type.clone()),
                    ("Effective", date(summary.effective_date)),
                    ("Ends", date(summary.end_date)),
                    ("Pages", summary.total_pages.to_string()),
                    ("Governing law", summary.governing_law.clone().unwrap_or_default()),
                    ("Fees", summary.total_fees_count.to_string()),
                    ("Pricing rules", summary.total_pricing_rules_count.to_string()),
                    ("Tiered", yes_no(c.has_tiered_structures)),
                    ("Commissions", yes_no(c.has_commissions)),
                    ("Asset-based", yes_no(c.has_asset_based_fees)),
                    ("Multi-currency", yes_no(c.multi_currency_flag)),
                    ("Primary currency", c.primary_currency.clone().unwrap_or_else(|| "-".into())),
                    ("Confidence", format!("{:.2}", summary.overall_confidence)),
                    ("Redacted fields", summary.redacted_fields_count.to_string()),
                    ("File", summary.source_file_name.clone()),
                    ("SHA-256", summary.file_hash.clone()),
                    ("Extracted", summary.extracted_at.to_rfc3339()),
                ];
                for (field, value) in rows {
                    builder.push_record([field.to_string(), value]);
                }
                Ok(self.styled(builder))
            }
        }
    }

    /// Format job and contract-type statistics.
    pub fn format_stats(&self, total: usize, jobs: &JobStats, types: &[ContractTypeSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "total_extractions": total,
                "jobs": jobs,
                "contract_types": types,
            }))?),
            OutputFormat::Quiet => Ok(total.to_string()),
            OutputFormat::Table => {
                let mut out = format!(
                    "Extractions: {}\nJobs: {} ({} completed, {} failed)\n",
                    total, jobs.total_jobs, jobs.completed_jobs, jobs.failed_jobs
                );
                if let Some(seconds) = jobs.avg_processing_seconds {
                    out.push_str(&format!("Average processing time: {:.1}s\n", seconds));
                }
                if let Some(attempts) = jobs.avg_attempts {
                    out.push_str(&format!("Average attempts: {:.2}\n", attempts));
                }
                if types.is_empty() {
                    return Ok(out);
                }

                let mut builder = Builder::default();
                builder.push_record(["Type", "Contracts", "Avg conf.", "Fees", "Rules", "Tiered", "Commission", "Multi-ccy"]);
                for t in types {
                    builder.push_record([
                        t.contract_type.clone(),
                        t.total_contracts.to_string(),
                        format!("{:.2}", t.avg_confidence),
                        t.total_fee_structures.to_string(),
                        t.total_pricing_rules.to_string(),
                        t.contracts_with_tiers.to_string(),
                        t.contracts_with_commissions.to_string(),
                        t.multi_currency_contracts.to_string(),
                    ]);
                }
                out.push('\n');
                out.push_str(&self.styled(builder));
                Ok(out)
            }
        }
    }

    /// Format the per-file report of a batch.
    pub fn format_batch(&self, reports: &[FileReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let items: Vec<_> = reports
                    .iter()
                    .map(|r| {
                        json!({
                            "file": r.file,
                            "status": if r.error.is_some() { "error" } else { "success" },
                            "database_id": r.record_id,
                            "duplicate": r.duplicate,
                            "attempts": r.attempts,
                            "output_path": r.artifact,
                            "error": r.error,
                        })
                    })
                    .collect();
                let failed = reports.iter().filter(|r| r.error.is_some()).count();
                Ok(serde_json::to_string_pretty(&json!({
                    "total_files": reports.len(),
                    "successful": reports.len() - failed,
                    "failed": failed,
                    "results": items,
                }))?)
            }
            OutputFormat::Quiet => Ok(reports
                .iter()
                .filter_map(|r| r.record_id.map(|id| id.to_string()))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["File", "Status", "ID", "Attempts", "Output"]);
                for r in reports {
                    let status = match (&r.error, r.duplicate) {
                        (Some(_), _) => self.colorize("failed", "red"),
                        (None, true) => self.colorize("duplicate", "yellow"),
                        (None, false) => self.colorize("ok", "green"),
                    };
                    let detail = r
                        .error
                        .clone()
                        .or_else(|| r.artifact.clone())
                        .unwrap_or_default();
                    builder.push_record([
                        r.file.clone(),
                        status,
                        r.record_id.map(|id| id.to_string()).unwrap_or_else(|| "-".into()),
                        r.attempts.to_string(),
                        detail,
                    ]);
                }
                Ok(self.styled(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn styled(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
