//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use termsheet_extractor::ExtractorConfig;
use termsheet_store::SqliteStore;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model service settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Extraction settings
    #[serde(default)]
    pub extraction: ExtractionSettings,

    /// Database settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Artifact and display settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Model service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model identifier
    pub name: String,

    /// API key; usually supplied through `OPENAI_API_KEY` instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Alternative API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on generated tokens per call
    pub max_output_tokens: u32,

    /// Per-call timeout in seconds
    pub call_timeout_secs: u64,
}

/// Extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Model calls allowed per document
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds
    pub retry_backoff_ms: u64,

    /// System prompt document
    pub system_prompt_path: PathBuf,

    /// User prompt document
    pub user_prompt_path: PathBuf,

    /// Documents processed at the same time in a batch
    pub concurrency: usize,

    /// Reuse earlier extractions of identical documents
    pub skip_duplicates: bool,
}

/// Database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file
    pub database_path: PathBuf,
}

/// Artifact and display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory extraction artifacts are written to
    pub directory: PathBuf,

    /// Default output format
    pub format: OutputFormat,

    /// Enable colored output
    pub color: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the configuration file and default database.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".termsheet"))
    }

    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration from a file, or defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Extractor configuration derived from these settings.
    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            model: self.model.name.clone(),
            temperature: self.model.temperature,
            max_output_tokens: self.model.max_output_tokens,
            max_attempts: self.extraction.max_attempts,
            call_timeout_secs: self.model.call_timeout_secs,
            retry_backoff_ms: self.extraction.retry_backoff_ms,
            system_prompt_path: self.extraction.system_prompt_path.clone(),
            user_prompt_path: self.extraction.user_prompt_path.clone(),
        }
    }

    /// The API key, or an error naming the variable to set.
    pub fn api_key(&self) -> Result<&str> {
        self.model
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CliError::Config("OPENAI_API_KEY is not set".into()))
    }

    /// Copy with the API key masked, for display.
    pub fn masked(&self) -> Self {
        let mut config = self.clone();
        config.model.api_key = config.model.api_key.as_deref().map(mask_key);
        config
    }
}

impl StorageSettings {
    /// Open the store, creating the database directory if needed.
    pub fn open_store(&self) -> Result<SqliteStore> {
        if let Some(parent) = self.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(SqliteStore::open(&self.database_path)?)
    }
}

/// Mask all but the ends of a secret.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

impl Default for ModelSettings {
    fn default() -> Self {
        let extractor = ExtractorConfig::default();
        Self {
            name: extractor.model,
            api_key: None,
            base_url: None,
            temperature: extractor.temperature,
            max_output_tokens: extractor.max_output_tokens,
            call_timeout_secs: extractor.call_timeout_secs,
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        let extractor = ExtractorConfig::default();
        Self {
            max_attempts: extractor.max_attempts,
            retry_backoff_ms: extractor.retry_backoff_ms,
            system_prompt_path: extractor.system_prompt_path,
            user_prompt_path: extractor.user_prompt_path,
            concurrency: 4,
            skip_duplicates: false,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        let database_path = Config::home()
            .map(|home| home.join("termsheet.db"))
            .unwrap_or_else(|_| PathBuf::from("termsheet.db"));
        Self { database_path }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("outputs"),
            format: OutputFormat::Table,
            color: true,
        }
    }
}
