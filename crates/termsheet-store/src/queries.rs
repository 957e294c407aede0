//! Read surface and maintenance operations

use crate::{SqliteStore, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use serde_json::Value;
use termsheet_domain::{Characteristics, ContractExtraction, RecordId};

const SUMMARY_COLUMNS: &str = "id, document_title, contract_type, effective_date, end_date, total_pages,
    governing_law, jurisdiction,
    total_base_compensation_count, total_fees_count, total_royalties_count,
    total_equity_count, total_expenses_count, total_pricing_rules_count,
    has_tiered_structures, has_commissions, has_asset_based_fees, multi_currency_flag, primary_currency,
    overall_confidence, redacted_fields_count, processing_warnings_count, model_used,
    source_file_name, source_file_size, file_hash, extracted_at, created_at, updated_at";

/// Scalar columns of a summary row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub id: RecordId,
    pub document_title: String,
    pub contract_type: String,
    pub effective_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_pages: i64,
    pub governing_law: Option<String>,
    pub jurisdiction: Option<String>,
    pub total_base_compensation_count: i64,
    pub total_fees_count: i64,
    pub total_royalties_count: i64,
    pub total_equity_count: i64,
    pub total_expenses_count: i64,
    pub total_pricing_rules_count: i64,
    pub characteristics: Characteristics,
    pub overall_confidence: f64,
    pub redacted_fields_count: i64,
    pub processing_warnings_count: i64,
    pub model_used: Option<String>,
    pub source_file_name: String,
    pub source_file_size: i64,
    pub file_hash: String,
    pub extracted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A summary row together with its raw JSON blobs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRecord {
    pub summary: ExtractionSummary,
    pub contract_metadata: Value,
    pub financial_terms: Value,
    pub pricing_rules: Value,
}

/// Per-contract-type aggregate over all stored extractions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractTypeSummary {
    pub contract_type: String,
    pub total_contracts: i64,
    pub avg_confidence: f64,
    pub total_fee_structures: i64,
    pub total_pricing_rules: i64,
    pub contracts_with_tiers: i64,
    pub contracts_with_commissions: i64,
    pub multi_currency_contracts: i64,
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<ExtractionSummary> {
    Ok(ExtractionSummary {
        id: RecordId::from_value(row.get(0)?),
        document_title: row.get(1)?,
        contract_type: row.get(2)?,
        effective_date: row.get(3)?,
        end_date: row.get(4)?,
        total_pages: row.get(5)?,
        governing_law: row.get(6)?,
        jurisdiction: row.get(7)?,
        total_base_compensation_count: row.get(8)?,
        total_fees_count: row.get(9)?,
        total_royalties_count: row.get(10)?,
        total_equity_count: row.get(11)?,
        total_expenses_count: row.get(12)?,
        total_pricing_rules_count: row.get(13)?,
        characteristics: Characteristics {
            has_tiered_structures: row.get(14)?,
            has_commissions: row.get(15)?,
            has_asset_based_fees: row.get(16)?,
            multi_currency_flag: row.get(17)?,
            primary_currency: row.get(18)?,
        },
        overall_confidence: row.get(19)?,
        redacted_fields_count: row.get(20)?,
        processing_warnings_count: row.get(21)?,
        model_used: row.get(22)?,
        source_file_name: row.get(23)?,
        source_file_size: row.get(24)?,
        file_hash: row.get(25)?,
        extracted_at: row.get(26)?,
        created_at: row.get(27)?,
        updated_at: row.get(28)?,
    })
}

impl SqliteStore {
    /// Look up an extraction's summary scalars and raw blobs
    pub fn get(&self, id: RecordId) -> Result<Option<ExtractionRecord>, StoreError> {
        let row = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, contract_metadata_json, financial_terms_json, pricing_rules_json
                 FROM contract_extractions WHERE id = ?1",
                SUMMARY_COLUMNS
            );
            Ok(conn
                .query_row(&sql, params![id.value()], |row| {
                    Ok((
                        summary_from_row(row)?,
                        row.get::<_, String>(29)?,
                        row.get::<_, String>(30)?,
                        row.get::<_, String>(31)?,
                    ))
                })
                .optional()?)
        })?;

        row.map(|(summary, metadata, terms, rules)| -> Result<_, StoreError> {
            Ok(ExtractionRecord {
                summary,
                contract_metadata: serde_json::from_str(&metadata)?,
                financial_terms: serde_json::from_str(&terms)?,
                pricing_rules: serde_json::from_str(&rules)?,
            })
        })
        .transpose()
    }

    /// Rebuild the full extraction from its four stored blobs
    pub fn load_extraction(&self, id: RecordId) -> Result<Option<ContractExtraction>, StoreError> {
        let blobs = self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT contract_metadata_json, financial_terms_json, pricing_rules_json,
                            extraction_metadata_json
                     FROM contract_extractions WHERE id = ?1",
                    params![id.value()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?)
        })?;

        blobs
            .map(|(metadata, terms, rules, quality)| -> Result<_, StoreError> {
                Ok(ContractExtraction {
                    contract_metadata: serde_json::from_str(&metadata)?,
                    financial_terms: serde_json::from_str(&terms)?,
                    pricing_rules: serde_json::from_str(&rules)?,
                    extraction_metadata: serde_json::from_str(&quality)?,
                })
            })
            .transpose()
    }

    /// Page through summaries, newest first
    pub fn list(&self, limit: usize, offset: usize) -> Result<Vec<ExtractionSummary>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM contract_extractions
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1 OFFSET ?2",
                SUMMARY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let summaries = stmt
                .query_map(params![limit as i64, offset as i64], summary_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(summaries)
        })
    }

    /// Number of stored extractions
    pub fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM contract_extractions", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }

    /// Most recent extraction of a document with this content hash
    pub fn find_by_hash(&self, hash: &str) -> Result<Option<RecordId>, StoreError> {
        self.with_conn(|conn| {
            let id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM contract_extractions WHERE file_hash = ?1
                     ORDER BY created_at DESC, id DESC LIMIT 1",
                    params![hash],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id.map(RecordId::from_value))
        })
    }

    /// Delete an extraction and every row it owns
    ///
    /// Returns whether a summary row existed.
    pub fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM contract_extractions WHERE id = ?1", params![id.value()])?;
            Ok(n > 0)
        })
    }

    /// Bump `updated_at`, the only in-place change a summary row allows
    pub fn touch(&self, id: RecordId) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE contract_extractions SET updated_at = ?1 WHERE id = ?2",
                params![Utc::now(), id.value()],
            )?;
            Ok(n > 0)
        })
    }

    /// Number of child rows owned by an extraction: (parties, fees, rules)
    pub fn child_counts(&self, id: RecordId) -> Result<(usize, usize, usize), StoreError> {
        self.with_conn(|conn| {
            let count = |table: &str| -> rusqlite::Result<usize> {
                let sql = format!("SELECT COUNT(*) FROM {} WHERE contract_extraction_id = ?1", table);
                conn.query_row(&sql, params![id.value()], |row| row.get::<_, i64>(0))
                    .map(|n| n as usize)
            };
            Ok((count("contract_parties")?, count("contract_fees")?, count("pricing_rules")?))
        })
    }

    /// Aggregate stored extractions by contract type, largest group first
    pub fn contract_type_summary(&self) -> Result<Vec<ContractTypeSummary>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT contract_type,
                        COUNT(*),
                        AVG(overall_confidence),
                        SUM(total_fees_count),
                        SUM(total_pricing_rules_count),
                        SUM(CASE WHEN has_tiered_structures THEN 1 ELSE 0 END),
                        SUM(CASE WHEN has_commissions THEN 1 ELSE 0 END),
                        SUM(CASE WHEN multi_currency_flag THEN 1 ELSE 0 END)
                 FROM contract_extractions
                 GROUP BY contract_type
                 ORDER BY COUNT(*) DESC, contract_type ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ContractTypeSummary {
                        contract_type: row.get(0)?,
                        total_contracts: row.get(1)?,
                        avg_confidence: row.get(2)?,
                        total_fee_structures: row.get(3)?,
                        total_pricing_rules: row.get(4)?,
                        contracts_with_tiers: row.get(5)?,
                        contracts_with_commissions: row.get(6)?,
                        multi_currency_contracts: row.get(7)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
