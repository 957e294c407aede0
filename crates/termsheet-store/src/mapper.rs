//! Projection of a validated extraction into relational rows

use crate::{SqliteStore, StoreError};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Transaction};
use termsheet_domain::{content_hash, ContractExtraction, FeeFlags, RecordId};
use tracing::{debug, info};

/// Date formats tried in order when reading contract dates
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Normalize a party name for fuzzy matching
///
/// Lowercases, trims surrounding whitespace, then strips commas and periods.
///
/// ```
/// use termsheet_store::normalize_name;
///
/// assert_eq!(normalize_name("  Acme, Inc. "), "acme inc");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().trim().replace([',', '.'], "")
}

/// Parse a free-text contract date
///
/// Empty or unparseable text yields `None`, never an error.
pub fn parse_contract_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

impl SqliteStore {
    /// Insert the summary row and all child rows in one transaction
    pub(crate) fn insert_extraction(
        &self,
        extraction: &ContractExtraction,
        filename: &str,
        bytes: &[u8],
    ) -> Result<RecordId, StoreError> {
        let file_hash = content_hash(bytes);
        let blobs = Blobs::of(extraction)?;

        let id = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let id = insert_summary(&tx, extraction, &blobs, filename, bytes.len(), &file_hash)?;
            insert_parties(&tx, id, extraction)?;
            insert_fees(&tx, id, extraction)?;
            insert_rules(&tx, id, extraction)?;
            tx.commit()?;
            Ok(id)
        })?;

        info!(
            record_id = id,
            filename,
            file_hash = %file_hash,
            fees = extraction.financial_terms.fees.len(),
            "Persisted extraction"
        );
        Ok(RecordId::from_value(id))
    }
}

/// The four raw JSON blobs of an extraction
struct Blobs {
    contract_metadata: String,
    financial_terms: String,
    pricing_rules: String,
    extraction_metadata: String,
}

impl Blobs {
    fn of(extraction: &ContractExtraction) -> Result<Self, serde_json::Error> {
        Ok(Self {
            contract_metadata: serde_json::to_string(&extraction.contract_metadata)?,
            financial_terms: serde_json::to_string(&extraction.financial_terms)?,
            pricing_rules: serde_json::to_string(&extraction.pricing_rules)?,
            extraction_metadata: serde_json::to_string(&extraction.extraction_metadata)?,
        })
    }
}

fn insert_summary(
    tx: &Transaction<'_>,
    extraction: &ContractExtraction,
    blobs: &Blobs,
    filename: &str,
    file_size: usize,
    file_hash: &str,
) -> Result<i64, StoreError> {
    let metadata = &extraction.contract_metadata;
    let terms = &extraction.financial_terms;
    let quality = &extraction.extraction_metadata;
    let characteristics = terms.characteristics();
    let now = Utc::now();

    tx.execute(
        "INSERT INTO contract_extractions (
            document_title, contract_type, effective_date, end_date, total_pages,
            governing_law, jurisdiction,
            total_base_compensation_count, total_fees_count, total_royalties_count,
            total_equity_count, total_expenses_count, total_pricing_rules_count,
            has_tiered_structures, has_commissions, has_asset_based_fees,
            multi_currency_flag, primary_currency,
            overall_confidence, redacted_fields_count, processing_warnings_count, model_used,
            contract_metadata_json, financial_terms_json, pricing_rules_json, extraction_metadata_json,
            source_file_name, source_file_size, file_hash,
            extracted_at, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18,
            ?19, ?20, ?21, ?22,
            ?23, ?24, ?25, ?26,
            ?27, ?28, ?29,
            ?30, ?30, ?30
        )",
        params![
            metadata.document_title,
            metadata.contract_type,
            parse_contract_date(&metadata.effective_date),
            parse_contract_date(&metadata.end_date),
            metadata.total_pages,
            metadata.governing_law,
            metadata.jurisdiction,
            terms.base_compensation.len() as i64,
            terms.fees.len() as i64,
            terms.royalties.len() as i64,
            terms.equity_compensation.len() as i64,
            terms.expenses.len() as i64,
            extraction.pricing_rules.rules.len() as i64,
            characteristics.has_tiered_structures,
            characteristics.has_commissions,
            characteristics.has_asset_based_fees,
            characteristics.multi_currency_flag,
            characteristics.primary_currency,
            quality.overall_confidence,
            quality.redacted_fields_count,
            quality.processing_warnings.len() as i64,
            quality.model_used,
            blobs.contract_metadata,
            blobs.financial_terms,
            blobs.pricing_rules,
            blobs.extraction_metadata,
            filename,
            file_size as i64,
            file_hash,
            now,
        ],
    )?;

    let id = tx.last_insert_rowid();
    debug!(record_id = id, "Inserted summary row");
    Ok(id)
}

fn insert_parties(tx: &Transaction<'_>, id: i64, extraction: &ContractExtraction) -> Result<(), StoreError> {
    let now = Utc::now();
    let mut stmt = tx.prepare(
        "INSERT INTO contract_parties (
            contract_extraction_id, position, entity_name, entity_type, role,
            address, jurisdiction, normalized_name, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;

    for (position, party) in extraction.contract_metadata.parties.iter().enumerate() {
        stmt.execute(params![
            id,
            position as i64,
            party.entity_name,
            party.entity_type,
            party.role,
            party.address,
            party.jurisdiction,
            normalize_name(&party.entity_name),
            now,
        ])?;
    }
    Ok(())
}

fn insert_fees(tx: &Transaction<'_>, id: i64, extraction: &ContractExtraction) -> Result<(), StoreError> {
    let now = Utc::now();
    let mut stmt = tx.prepare(
        "INSERT INTO contract_fees (
            contract_extraction_id, position, fee_description, fee_type,
            amount_value, amount_currency, calculation_method, frequency, applies_to,
            is_tiered, is_asset_based, is_commission, has_minimum, has_maximum, is_redacted,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
    )?;

    for (position, fee) in extraction.financial_terms.fees.iter().enumerate() {
        let flags = FeeFlags::for_fee(fee);
        stmt.execute(params![
            id,
            position as i64,
            fee.description,
            fee.fee_type.as_str(),
            fee.amount.value.to_string(),
            fee.amount.currency,
            fee.calculation_method,
            fee.frequency.as_str(),
            fee.applies_to,
            flags.is_tiered,
            flags.is_asset_based,
            flags.is_commission,
            flags.has_minimum,
            flags.has_maximum,
            flags.is_redacted,
            now,
        ])?;
    }
    Ok(())
}

fn insert_rules(tx: &Transaction<'_>, id: i64, extraction: &ContractExtraction) -> Result<(), StoreError> {
    let now = Utc::now();
    let mut stmt = tx.prepare(
        "INSERT INTO pricing_rules (
            contract_extraction_id, position, rule_name, rule_description, rule_type,
            triggers, calculation_summary, applies_to, effective_period, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;

    for (position, rule) in extraction.pricing_rules.rules.iter().enumerate() {
        stmt.execute(params![
            id,
            position as i64,
            rule.rule_name,
            rule.rule_description,
            rule.rule_type,
            rule.triggers,
            rule.calculation,
            rule.applies_to,
            rule.effective_period,
            now,
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Acme Holdings, L.L.C."), "acme holdings llc");
        assert_eq!(normalize_name("   "), "");
        assert_eq!(normalize_name("ÉCOLE S.A."), "école sa");
    }

    #[test]
    fn test_parse_contract_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_contract_date("2024-03-15"), expected);
        assert_eq!(parse_contract_date("2024/03/15"), expected);
    }

    #[test]
    fn test_parse_contract_date_absorbs_garbage() {
        assert_eq!(parse_contract_date(""), None);
        assert_eq!(parse_contract_date("March 15, 2024"), None);
        assert_eq!(parse_contract_date("15/03/2024"), None);
        assert_eq!(parse_contract_date("2024-02-30"), None);
    }
}
