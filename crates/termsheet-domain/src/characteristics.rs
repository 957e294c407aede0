//! Characteristic analysis of financial terms
//!
//! Two independent sets of flags are derived here:
//!
//! - [`Characteristics`] summarise a whole contract and live on the summary row
//! - [`FeeFlags`] describe a single fee and live on that fee's row
//!
//! Their rules overlap but are not identical, and downstream queries depend on
//! each as-is, so neither is expressed in terms of the other.

use crate::extraction::{FeeTerm, FinancialTerms};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Contract-level flags for fast filtering without parsing JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    /// Some fee mentions tiers or a percentage
    pub has_tiered_structures: bool,
    /// Some fee is a commission
    pub has_commissions: bool,
    /// Some fee is computed from assets
    pub has_asset_based_fees: bool,
    /// More than one currency appears across fees and base compensation
    pub multi_currency_flag: bool,
    /// One member of the currency set, if any
    pub primary_currency: Option<String>,
}

impl Characteristics {
    /// Analyze financial terms in their JSON form
    ///
    /// Total over any input: missing fields, non-string values and non-array
    /// sequences contribute nothing. The result does not depend on the order
    /// of fees or compensation items.
    pub fn from_json(financial_terms: &Value) -> Self {
        let mut characteristics = Characteristics::default();
        let mut currencies = BTreeSet::new();

        for fee in items(financial_terms, "fees") {
            let fee_type = lowercase_field(fee, "fee_type");
            let calculation = lowercase_field(fee, "calculation_method");

            if fee_type.contains("tier") || calculation.contains("tier") || calculation.contains('%') {
                characteristics.has_tiered_structures = true;
            }

            if fee_type.contains("commission") {
                characteristics.has_commissions = true;
            }

            if fee_type.contains("asset") || calculation.contains("asset") {
                characteristics.has_asset_based_fees = true;
            }

            if let Some(currency) = amount_currency(fee) {
                currencies.insert(currency.to_string());
            }
        }

        for compensation in items(financial_terms, "base_compensation") {
            if let Some(currency) = amount_currency(compensation) {
                currencies.insert(currency.to_string());
            }
        }

        characteristics.multi_currency_flag = currencies.len() > 1;
        // Smallest by ordering; callers must not rely on which member is chosen.
        characteristics.primary_currency = currencies.into_iter().next();

        characteristics
    }
}

impl FinancialTerms {
    /// Derive contract-level characteristics
    pub fn characteristics(&self) -> Characteristics {
        serde_json::to_value(self)
            .map(|value| Characteristics::from_json(&value))
            .unwrap_or_default()
    }
}

/// Flags describing one fee in isolation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeFlags {
    pub is_tiered: bool,
    pub is_asset_based: bool,
    pub is_commission: bool,
    pub has_minimum: bool,
    pub has_maximum: bool,
    pub is_redacted: bool,
}

impl FeeFlags {
    /// Compute the flags from the fee's own type, calculation and amounts
    pub fn for_fee(fee: &FeeTerm) -> Self {
        let fee_type = fee.fee_type.as_str();
        let calculation = fee.calculation_method.to_lowercase();

        Self {
            is_tiered: fee_type.contains("tiered") || calculation.contains("tier"),
            is_asset_based: fee_type.contains("asset") || calculation.contains("asset"),
            is_commission: fee_type.contains("commission"),
            has_minimum: fee.minimum_amount.value.is_present(),
            has_maximum: fee.maximum_amount.value.is_present(),
            is_redacted: fee.amount.is_redacted,
        }
    }
}

fn items<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn lowercase_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

fn amount_currency(item: &Value) -> Option<&str> {
    item.get("amount")
        .and_then(|amount| amount.get("currency"))
        .and_then(Value::as_str)
        .filter(|currency| !currency.is_empty())
}
