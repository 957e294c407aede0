//! Termsheet Domain Layer
//!
//! This crate contains the value objects and rules that every other layer of
//! Termsheet depends upon. It defines the typed shape of a contract extraction,
//! the strict structured-output contract derived from it, the characteristic
//! analysis used for fast filtering, content hashing for document identity,
//! and the trait seams behind which infrastructure lives.
//!
//! ## Key Concepts
//!
//! - **ContractExtraction**: the validated result of reading one contract
//! - **Structured-output contract**: the strict JSON Schema handed to the model
//! - **Characteristics**: boolean/enum flags derived from financial terms
//! - **Content hash**: SHA-256 of the raw document bytes
//!
//! ## Architecture
//!
//! - Pure value types and functions only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(clippy::all)]

pub mod characteristics;
pub mod extraction;
pub mod identity;
pub mod schema;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use characteristics::{Characteristics, FeeFlags};
pub use extraction::{
    BaseCompensation, ContractExtraction, ContractMetadata, ContractParty, EquityTerm,
    ExpenseTerm, ExtractionMetadata, FeeTerm, FeeType, FinancialTerms, FlexibleValue,
    FrequencyType, MonetaryAmount, PaymentTiming, PaymentType, PricingRule, PricingRules,
    RoyaltyTerm,
};
pub use identity::{content_hash, RecordId};
pub use traits::{
    CompletionRequest, DocumentHandle, ExtractionStore, JobRecord, JobStatus, ModelService,
};
pub use validation::ValidationError;
