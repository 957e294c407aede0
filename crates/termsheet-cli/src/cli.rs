//! CLI command definitions and argument parsing.

use crate::config::{Config, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Termsheet - Extract financial terms from PDF contracts.
#[derive(Debug, Parser)]
#[command(name = "termsheet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// SQLite database file
    #[arg(long, env = "TERMSHEET_DB", global = true)]
    pub db: Option<PathBuf>,

    /// API key for the model service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model identifier
    #[arg(long, env = "OPENAI_MODEL", global = true)]
    pub model: Option<String>,

    /// Model service base URL
    #[arg(long, env = "OPENAI_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract financial terms from one or more PDF contracts
    Extract(ExtractArgs),

    /// Show a stored extraction
    Show(ShowArgs),

    /// List stored extractions, newest first
    List(ListArgs),

    /// Show job and contract-type statistics
    Stats,

    /// Delete stored extractions
    Delete(DeleteArgs),

    /// Print the content hash of a file and any extraction already stored for it
    Hash(HashArgs),

    /// Print the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// PDF files to extract
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Directory for JSON artifacts
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output: Option<PathBuf>,

    /// System prompt document
    #[arg(long, env = "SYSTEM_PROMPT_PATH")]
    pub system_prompt: Option<PathBuf>,

    /// User prompt document
    #[arg(long, env = "USER_PROMPT_PATH")]
    pub user_prompt: Option<PathBuf>,

    /// Model calls allowed per document
    #[arg(short, long, env = "MAX_RETRIES")]
    pub retries: Option<u32>,

    /// Documents processed at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Reuse earlier extractions of identical documents
    #[arg(long)]
    pub skip_duplicates: bool,

    /// Only print the per-file report
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Extraction ID
    pub id: i64,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Number of results to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,
}

/// Arguments for the delete command.
#[derive(Debug, Parser)]
pub struct DeleteArgs {
    /// Extraction IDs to delete
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

/// Arguments for the hash command.
#[derive(Debug, Parser)]
pub struct HashArgs {
    /// File to hash
    pub file: PathBuf,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub save: bool,
}

impl Cli {
    /// Apply global flag and environment overrides to a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(db) = &self.db {
            config.storage.database_path = db.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.model.api_key = Some(api_key.clone());
        }
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.model.base_url = Some(base_url.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format.into();
        }
        if self.no_color {
            config.output.color = false;
        }
    }
}

impl ExtractArgs {
    /// Apply extract flag and environment overrides to a loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output.directory = output.clone();
        }
        if let Some(path) = &self.system_prompt {
            config.extraction.system_prompt_path = path.clone();
        }
        if let Some(path) = &self.user_prompt {
            config.extraction.user_prompt_path = path.clone();
        }
        if let Some(retries) = self.retries {
            config.extraction.max_attempts = retries;
        }
        if let Some(concurrency) = self.concurrency {
            config.extraction.concurrency = concurrency;
        }
        if self.skip_duplicates {
            config.extraction.skip_duplicates = true;
        }
    }
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::try_parse_from([
            "termsheet",
            "extract",
            "a.pdf",
            "b.PDF",
            "--retries",
            "5",
            "--skip-duplicates",
        ])
        .unwrap();
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.retries, Some(5));
                assert!(args.skip_duplicates);
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_extract_requires_files() {
        assert!(Cli::try_parse_from(["termsheet", "extract"]).is_err());
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["termsheet", "list"]).unwrap();
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.limit, 10);
                assert_eq!(args.offset, 0);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from([
            "termsheet",
            "stats",
            "--db",
            "/tmp/contracts.db",
            "--model",
            "gpt-4o-mini",
            "--format",
            "json",
            "--no-color",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/contracts.db"));
        assert_eq!(config.model.name, "gpt-4o-mini");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.color);
    }

    #[test]
    fn test_extract_overrides() {
        let cli = Cli::try_parse_from([
            "termsheet",
            "extract",
            "a.pdf",
            "--output",
            "out",
            "--system-prompt",
            "sys.md",
            "--concurrency",
            "2",
        ])
        .unwrap();
        let Command::Extract(args) = cli.command else {
            panic!("Expected Extract command");
        };

        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.extraction.system_prompt_path, PathBuf::from("sys.md"));
        assert_eq!(config.extraction.concurrency, 2);
    }
}
