//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Model identifier sent with every completion request
    pub model: String,

    /// Sampling temperature (kept low for near-deterministic output)
    pub temperature: f32,

    /// Upper bound on generated tokens per call
    pub max_output_tokens: u32,

    /// Model calls allowed per document
    pub max_attempts: u32,

    /// Maximum time for a single model call (seconds)
    pub call_timeout_secs: u64,

    /// Delay before the second attempt, doubled for each later one (milliseconds)
    pub retry_backoff_ms: u64,

    /// Path of the system prompt document
    pub system_prompt_path: PathBuf,

    /// Path of the user prompt document
    pub user_prompt_path: PathBuf,
}

impl ExtractorConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Delay before the given attempt (1-based); zero for the first
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (attempt - 2).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            model: "gpt-4o-2024-08-06".to_string(),
            temperature: 0.1,
            max_output_tokens: 8192,
            max_attempts: 3,
            call_timeout_secs: 300,
            retry_backoff_ms: 1_000,
            system_prompt_path: PathBuf::from("prompts/system_prompt.md"),
            user_prompt_path: PathBuf::from("prompts/user_prompt.md"),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: single attempt, short timeout, no backoff
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 1,
            call_timeout_secs: 60,
            retry_backoff_ms: 0,
            ..Self::default()
        }
    }

    /// Lenient preset: more attempts, longer timeout, longer backoff
    pub fn lenient() -> Self {
        Self {
            max_attempts: 5,
            call_timeout_secs: 600,
            retry_backoff_ms: 2_000,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
