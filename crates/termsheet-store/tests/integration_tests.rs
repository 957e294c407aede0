//! Integration tests for termsheet-store
//!
//! These tests exercise the full write path and the read surface.

use chrono::{NaiveDate, Utc};
use termsheet_domain::{
    content_hash, ContractExtraction, ExtractionStore, JobRecord, JobStatus, RecordId,
};
use termsheet_store::{SqliteStore, StoreError};

const FIXTURE: &str = include_str!("../../../testdata/service_agreement.json");
const PDF_BYTES: &[u8] = b"%PDF-1.7 master services agreement";

fn fixture() -> ContractExtraction {
    serde_json::from_str(FIXTURE).unwrap()
}

fn job(status: JobStatus, extraction_id: Option<RecordId>) -> JobRecord {
    let now = Utc::now();
    JobRecord {
        file_name: "msa.pdf".to_string(),
        file_size: PDF_BYTES.len() as u64,
        file_hash: content_hash(PDF_BYTES),
        status,
        error_message: match status {
            JobStatus::Completed => None,
            JobStatus::Failed => Some("parse failure after 3 attempts".to_string()),
        },
        started_at: now,
        finished_at: now,
        attempts: 3,
        remote_file_id: Some("file-xyz".to_string()),
        model: "gpt-4o-2024-08-06".to_string(),
        extraction_id,
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::open_in_memory();
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_persist_round_trips_blobs() {
    let store = SqliteStore::open_in_memory().unwrap();
    let extraction = fixture();

    let id = store.persist(&extraction, "msa.pdf", PDF_BYTES).unwrap();

    let loaded = store.load_extraction(id).unwrap().expect("extraction should exist");
    assert_eq!(loaded, extraction);

    let record = store.get(id).unwrap().expect("record should exist");
    assert_eq!(record.contract_metadata, serde_json::to_value(&extraction.contract_metadata).unwrap());
    assert_eq!(record.financial_terms, serde_json::to_value(&extraction.financial_terms).unwrap());
    assert_eq!(record.pricing_rules, serde_json::to_value(&extraction.pricing_rules).unwrap());
}

#[test]
fn test_summary_scalars() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap();

    let summary = store.get(id).unwrap().unwrap().summary;
    assert_eq!(summary.id, id);
    assert_eq!(summary.document_title, "Master Services Agreement");
    assert_eq!(summary.effective_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    assert_eq!(summary.end_date, NaiveDate::from_ymd_opt(2026, 1, 14));
    assert_eq!(summary.total_pages, 18);

    assert_eq!(summary.total_base_compensation_count, 1);
    assert_eq!(summary.total_fees_count, 2);
    assert_eq!(summary.total_royalties_count, 0);
    assert_eq!(summary.total_equity_count, 1);
    assert_eq!(summary.total_expenses_count, 1);
    assert_eq!(summary.total_pricing_rules_count, 2);
    assert_eq!(summary.processing_warnings_count, 1);
    assert_eq!(summary.redacted_fields_count, 1);

    assert!(summary.characteristics.has_tiered_structures);
    assert!(summary.characteristics.has_commissions);
    assert!(summary.characteristics.has_asset_based_fees);
    assert!(summary.characteristics.multi_currency_flag);
    assert!(summary.characteristics.primary_currency.is_some());

    assert_eq!(summary.source_file_name, "msa.pdf");
    assert_eq!(summary.source_file_size, PDF_BYTES.len() as i64);
    assert_eq!(summary.file_hash, content_hash(PDF_BYTES));
    assert_eq!(summary.created_at, summary.updated_at);
}

#[test]
fn test_unparseable_dates_become_null() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut extraction = fixture();
    extraction.contract_metadata.effective_date = "upon signature".to_string();
    extraction.contract_metadata.end_date = String::new();

    let id = store.persist(&extraction, "msa.pdf", PDF_BYTES).unwrap();
    let summary = store.get(id).unwrap().unwrap().summary;
    assert_eq!(summary.effective_date, None);
    assert_eq!(summary.end_date, None);

    // The blob keeps the original text
    let loaded = store.load_extraction(id).unwrap().unwrap();
    assert_eq!(loaded.contract_metadata.effective_date, "upon signature");
}

#[test]
fn test_child_rows_written() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap();
    assert_eq!(store.child_counts(id).unwrap(), (2, 2, 2));
}

#[test]
fn test_child_row_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("termsheet.db");
    let id = SqliteStore::open(&path)
        .unwrap()
        .persist(&fixture(), "msa.pdf", PDF_BYTES)
        .unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT fee_type, amount_value, is_tiered, is_asset_based, is_commission,
                    has_minimum, has_maximum, is_redacted
             FROM contract_fees WHERE contract_extraction_id = ?1 ORDER BY position",
        )
        .unwrap();
    let fees: Vec<(String, String, bool, bool, bool, bool, bool, bool)> = stmt
        .query_map([id.value()], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        fees,
        vec![
            ("management_fee".to_string(), "0.75".to_string(), true, true, false, true, false, false),
            ("commission".to_string(), "[REDACTED]".to_string(), false, false, true, false, true, true),
        ]
    );

    let mut stmt = conn
        .prepare(
            "SELECT entity_name, normalized_name FROM contract_parties
             WHERE contract_extraction_id = ?1 ORDER BY position",
        )
        .unwrap();
    let parties: Vec<(String, String)> = stmt
        .query_map([id.value()], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        parties,
        vec![
            ("Northwind Capital, LLC.".to_string(), "northwind capital llc".to_string()),
            ("Fabrikam Advisors Inc.".to_string(), "fabrikam advisors inc".to_string()),
        ]
    );
}

#[test]
fn test_fee_constraint_violation_rolls_back_everything() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut extraction = fixture();
    // Sorts after "USD", so the summary row itself stays within limits
    extraction.financial_terms.fees[1].amount.currency = "yen (payable in cash)".to_string();

    let result = store.persist(&extraction, "msa.pdf", PDF_BYTES);
    assert!(matches!(result, Err(StoreError::Database(_))));

    // The summary row would have taken the first id
    assert!(store.get(RecordId::from_value(1)).unwrap().is_none());
    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(store.child_counts(RecordId::from_value(1)).unwrap(), (0, 0, 0));
    assert!(store.find_by_hash(&content_hash(PDF_BYTES)).unwrap().is_none());
}

#[test]
fn test_store_usable_after_rollback() {
    let store = SqliteStore::open_in_memory().unwrap();
    let mut bad = fixture();
    bad.contract_metadata.parties[0].entity_name = "x".repeat(301);
    assert!(store.persist(&bad, "msa.pdf", PDF_BYTES).is_err());

    let id = store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.child_counts(id).unwrap(), (2, 2, 2));
}

#[test]
fn test_duplicate_submissions_are_allowed() {
    let store = SqliteStore::open_in_memory().unwrap();
    let first = store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap();
    let second = store.persist(&fixture(), "msa-copy.pdf", PDF_BYTES).unwrap();

    assert_ne!(first, second);
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.find_by_hash(&content_hash(PDF_BYTES)).unwrap(), Some(second));
    assert_eq!(store.find_by_hash(&content_hash(b"other")).unwrap(), None);
}

#[test]
fn test_list_newest_first_with_paging() {
    let store = SqliteStore::open_in_memory().unwrap();
    let ids: Vec<RecordId> = (0..5)
        .map(|i| {
            let mut extraction = fixture();
            extraction.contract_metadata.document_title = format!("Agreement {}", i);
            store.persist(&extraction, "msa.pdf", PDF_BYTES).unwrap()
        })
        .collect();

    let page = store.list(2, 0).unwrap();
    assert_eq!(page.iter().map(|s| s.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);

    let page = store.list(2, 4).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, ids[0]);

    assert!(store.list(10, 5).unwrap().is_empty());
}

#[test]
fn test_delete_cascades() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap();
    let job_id = store.record_job(&job(JobStatus::Completed, Some(id))).unwrap();

    assert!(store.delete(id).unwrap());
    assert!(store.get(id).unwrap().is_none());
    assert_eq!(store.child_counts(id).unwrap(), (0, 0, 0));

    // The job log outlives the extraction
    assert_eq!(store.job_extraction(job_id).unwrap(), None);
    assert!(!store.delete(id).unwrap());
}

#[test]
fn test_touch_only_moves_updated_at() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap();
    let before = store.get(id).unwrap().unwrap().summary;

    assert!(store.touch(id).unwrap());
    let after = store.get(id).unwrap().unwrap().summary;

    assert!(after.updated_at >= before.updated_at);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.document_title, before.document_title);
    assert!(!store.touch(RecordId::from_value(999)).unwrap());
}

#[test]
fn test_contract_type_summary() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.persist(&fixture(), "a.pdf", PDF_BYTES).unwrap();
    store.persist(&fixture(), "b.pdf", PDF_BYTES).unwrap();

    let mut licence = fixture();
    licence.contract_metadata.contract_type = "licensing".to_string();
    licence.financial_terms.fees.clear();
    licence.extraction_metadata.overall_confidence = 0.5;
    store.persist(&licence, "c.pdf", PDF_BYTES).unwrap();

    let summary = store.contract_type_summary().unwrap();
    assert_eq!(summary.len(), 2);

    let services = &summary[0];
    assert_eq!(services.contract_type, "services");
    assert_eq!(services.total_contracts, 2);
    assert_eq!(services.total_fee_structures, 4);
    assert_eq!(services.total_pricing_rules, 4);
    assert_eq!(services.contracts_with_tiers, 2);
    assert_eq!(services.contracts_with_commissions, 2);
    assert_eq!(services.multi_currency_contracts, 2);
    assert!((services.avg_confidence - 0.87).abs() < 1e-9);

    let licensing = &summary[1];
    assert_eq!(licensing.total_contracts, 1);
    assert_eq!(licensing.contracts_with_commissions, 0);
}

#[test]
fn test_job_log() {
    let store = SqliteStore::open_in_memory().unwrap();
    let id = store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap();

    store.record_job(&job(JobStatus::Completed, Some(id))).unwrap();
    store.record_job(&job(JobStatus::Failed, None)).unwrap();

    let stats = store.job_stats().unwrap();
    assert_eq!(stats.total_jobs, 2);
    assert_eq!(stats.completed_jobs, 1);
    assert_eq!(stats.failed_jobs, 1);
    assert_eq!(stats.avg_attempts, Some(3.0));
}

#[test]
fn test_job_stats_empty() {
    let store = SqliteStore::open_in_memory().unwrap();
    let stats = store.job_stats().unwrap();
    assert_eq!(stats.total_jobs, 0);
    assert_eq!(stats.avg_processing_seconds, None);
}

#[test]
fn test_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("termsheet.db");

    let id = {
        let store = SqliteStore::open(&path).unwrap();
        store.persist(&fixture(), "msa.pdf", PDF_BYTES).unwrap()
    };

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.load_extraction(id).unwrap(), Some(fixture()));
}

mod generated {
    use super::*;
    use proptest::prelude::*;
    use termsheet_domain::FlexibleValue;

    fn flexible_value() -> impl Strategy<Value = FlexibleValue> {
        prop_oneof![
            any::<i64>().prop_map(FlexibleValue::from),
            (-1.0e9f64..1.0e9).prop_map(|n| {
                serde_json::Number::from_f64(n)
                    .map(FlexibleValue::Number)
                    .unwrap_or_else(|| FlexibleValue::from(""))
            }),
            "\\PC{0,24}".prop_map(FlexibleValue::Text),
        ]
    }

    fn currency() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["", "USD", "EUR", "JPY", "CHF"]).prop_map(str::to_string)
    }

    fn extraction() -> impl Strategy<Value = ContractExtraction> {
        let base = fixture();
        let fee_template = base.financial_terms.fees[0].clone();
        let party_template = base.contract_metadata.parties[0].clone();

        let fee = (flexible_value(), flexible_value(), currency(), "\\PC{0,40}").prop_map(
            move |(value, minimum, currency, description)| {
                let mut fee = fee_template.clone();
                fee.amount.value = value;
                fee.amount.currency = currency;
                fee.minimum_amount.value = minimum;
                fee.description = description;
                fee
            },
        );
        let party = "\\PC{1,40}".prop_map(move |name| {
            let mut party = party_template.clone();
            party.entity_name = name;
            party
        });

        (
            "\\PC{0,60}",
            prop::collection::vec(fee, 0..4),
            prop::collection::vec(party, 0..3),
            any::<bool>(),
            0.0f64..=1.0,
            prop::collection::vec("\\PC{0,30}", 0..3),
        )
            .prop_map(move |(title, fees, parties, keep_rules, confidence, warnings)| {
                let mut extraction = base.clone();
                extraction.contract_metadata.document_title = title;
                extraction.contract_metadata.parties = parties;
                extraction.financial_terms.fees = fees;
                if !keep_rules {
                    extraction.pricing_rules.rules.clear();
                    extraction.financial_terms.base_compensation.clear();
                }
                extraction.extraction_metadata.overall_confidence = confidence;
                extraction.extraction_metadata.processing_warnings = warnings;
                extraction
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Property: whatever is persisted is loaded back unchanged
        #[test]
        fn test_generated_extractions_round_trip(extraction in extraction()) {
            let store = SqliteStore::open_in_memory().unwrap();
            let id = store.persist(&extraction, "generated.pdf", PDF_BYTES).unwrap();

            prop_assert_eq!(store.load_extraction(id).unwrap(), Some(extraction.clone()));

            let record = store.get(id).unwrap().unwrap();
            prop_assert_eq!(record.financial_terms, serde_json::to_value(&extraction.financial_terms).unwrap());
            prop_assert_eq!(
                store.child_counts(id).unwrap(),
                (
                    extraction.contract_metadata.parties.len(),
                    extraction.financial_terms.fees.len(),
                    extraction.pricing_rules.rules.len(),
                )
            );
        }
    }
}
