//! Contract extraction value types
//!
//! These types are the wire shape the external model must produce. Every
//! struct rejects unknown fields and every enum is closed, so a response that
//! deviates from the shape fails deserialization instead of being coerced.

use schemars::gen::SchemaGenerator;
use schemars::schema::{InstanceType, Schema, SchemaObject, SubschemaValidation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value the model may report either as a number or as free text
///
/// Free text covers redacted placeholders such as `"[REDACTED]"` and
/// descriptive amounts such as `"2% of AUM"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleValue {
    /// Numeric value, integer or decimal, kept exactly as sent
    Number(serde_json::Number),
    /// Free-text value
    Text(String),
}

impl FlexibleValue {
    /// Whether the value carries anything
    ///
    /// Empty text and numeric zero count as absent.
    pub fn is_present(&self) -> bool {
        match self {
            FlexibleValue::Text(text) => !text.is_empty(),
            FlexibleValue::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        }
    }
}

impl fmt::Display for FlexibleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexibleValue::Number(number) => write!(f, "{}", number),
            FlexibleValue::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<&str> for FlexibleValue {
    fn from(text: &str) -> Self {
        FlexibleValue::Text(text.to_string())
    }
}

impl From<i64> for FlexibleValue {
    fn from(value: i64) -> Self {
        FlexibleValue::Number(value.into())
    }
}

impl JsonSchema for FlexibleValue {
    fn schema_name() -> String {
        "FlexibleValue".to_string()
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        let variant = |instance_type: InstanceType| -> Schema {
            SchemaObject {
                instance_type: Some(instance_type.into()),
                ..Default::default()
            }
            .into()
        };

        SchemaObject {
            subschemas: Some(Box::new(SubschemaValidation {
                any_of: Some(vec![variant(InstanceType::Number), variant(InstanceType::String)]),
                ..Default::default()
            })),
            ..Default::default()
        }
        .into()
    }
}

/// How a compensation item is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PaymentType {
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "equity")]
    Equity,
    #[serde(rename = "in-kind")]
    InKind,
    #[serde(rename = "percentage")]
    Percentage,
    #[serde(rename = "asset-based")]
    AssetBased,
    #[serde(rename = "hybrid")]
    Hybrid,
}

/// How often a payment recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum FrequencyType {
    #[serde(rename = "one-time")]
    OneTime,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "quarterly")]
    Quarterly,
    #[serde(rename = "annually")]
    Annually,
    #[serde(rename = "per-transaction")]
    PerTransaction,
    #[serde(rename = "upon-milestone")]
    UponMilestone,
}

// Variants carry no doc comments so the derived schema stays a flat `enum`.
/// Kind of fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    ServiceFee,
    ManagementFee,
    Commission,
    TransactionFee,
    AssetBasedFee,
    TieredFee,
    PenaltyFee,
    Reimbursement,
}

impl FeeType {
    /// Wire representation of the fee type
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::ServiceFee => "service_fee",
            FeeType::ManagementFee => "management_fee",
            FeeType::Commission => "commission",
            FeeType::TransactionFee => "transaction_fee",
            FeeType::AssetBasedFee => "asset_based_fee",
            FeeType::TieredFee => "tiered_fee",
            FeeType::PenaltyFee => "penalty_fee",
            FeeType::Reimbursement => "reimbursement",
        }
    }
}

impl FrequencyType {
    /// Wire representation of the frequency
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyType::OneTime => "one-time",
            FrequencyType::Monthly => "monthly",
            FrequencyType::Quarterly => "quarterly",
            FrequencyType::Annually => "annually",
            FrequencyType::PerTransaction => "per-transaction",
            FrequencyType::UponMilestone => "upon-milestone",
        }
    }
}

/// An amount of money, possibly masked in the source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MonetaryAmount {
    /// Numeric value or free text (may be a redaction placeholder)
    pub value: FlexibleValue,
    /// Currency code as written in the contract
    pub currency: String,
    /// Whether the value was masked
    pub is_redacted: bool,
    /// Description of the mask, e.g. `"[***]"`
    pub redaction_pattern: String,
}

/// A party to the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContractParty {
    pub entity_name: String,
    pub entity_type: String,
    pub role: String,
    pub address: String,
    pub jurisdiction: String,
}

/// When and how a payment is made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PaymentTiming {
    pub due_date: String,
    pub grace_period: String,
    pub late_fees: String,
    pub payment_method: String,
}

/// Descriptive metadata about the contract document
///
/// Dates are free text; they are not guaranteed to be parseable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContractMetadata {
    pub document_title: String,
    pub contract_type: String,
    pub effective_date: String,
    pub end_date: String,
    /// Parties in the order they appear in the document
    pub parties: Vec<ContractParty>,
    pub total_pages: i64,
    pub governing_law: String,
    pub jurisdiction: String,
}

/// A base compensation item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BaseCompensation {
    pub description: String,
    pub amount: MonetaryAmount,
    pub payment_type: PaymentType,
    pub frequency: FrequencyType,
    pub calculation_method: String,
    pub conditions: String,
    pub payment_timing: PaymentTiming,
}

/// A royalty arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RoyaltyTerm {
    pub description: String,
    pub rate: String,
    pub calculation_base: String,
    pub minimum_amount: String,
    pub maximum_amount: String,
    pub product_scope: String,
    pub territory: String,
    pub special_terms: String,
}

/// A fee charged under the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FeeTerm {
    pub description: String,
    pub fee_type: FeeType,
    pub amount: MonetaryAmount,
    pub calculation_method: String,
    pub frequency: FrequencyType,
    pub applies_to: String,
    pub minimum_amount: MonetaryAmount,
    pub maximum_amount: MonetaryAmount,
}

/// An equity grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EquityTerm {
    pub description: String,
    pub instrument_type: String,
    pub quantity: FlexibleValue,
    pub share_price: FlexibleValue,
    pub vesting_terms: String,
    pub conversion_rights: String,
}

/// An expense reimbursement arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExpenseTerm {
    pub category: String,
    pub coverage: String,
    pub amount_limit: MonetaryAmount,
    pub approval_required: bool,
    pub reimbursement_terms: String,
}

/// All financial terms of a contract
///
/// The sequences are independent; nothing in one refers to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FinancialTerms {
    pub base_compensation: Vec<BaseCompensation>,
    pub royalties: Vec<RoyaltyTerm>,
    pub fees: Vec<FeeTerm>,
    pub equity_compensation: Vec<EquityTerm>,
    pub expenses: Vec<ExpenseTerm>,
}

/// A business rule described in the contract (not executable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PricingRule {
    pub rule_name: String,
    pub rule_description: String,
    pub rule_type: String,
    pub triggers: String,
    pub calculation: String,
    pub applies_to: String,
    pub effective_period: String,
}

/// Ordered pricing rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PricingRules {
    pub rules: Vec<PricingRule>,
}

/// Quality information reported by the model about its own extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExtractionMetadata {
    pub extraction_timestamp: String,
    pub model_used: String,
    /// Confidence in `[0.0, 1.0]`
    pub overall_confidence: f64,
    pub redacted_fields_count: i64,
    pub extraction_notes: String,
    pub processing_warnings: Vec<String>,
}

/// Root of a contract extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ContractExtraction {
    pub contract_metadata: ContractMetadata,
    pub financial_terms: FinancialTerms,
    pub pricing_rules: PricingRules,
    pub extraction_metadata: ExtractionMetadata,
}
