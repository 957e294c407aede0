//! Loading of the externally supplied prompt documents

use crate::error::ExtractorError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// System and user instruction text, trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    /// Instruction sent as the system message
    pub system: String,
    /// Instruction sent alongside the document
    pub user: String,
}

/// Reads the two prompt documents from disk
///
/// The prompts are opaque text. They are read on every load so edits take
/// effect without a restart.
#[derive(Debug, Clone)]
pub struct PromptLoader {
    system_path: PathBuf,
    user_path: PathBuf,
}

impl PromptLoader {
    /// Create a loader for the given prompt files
    pub fn new(system_path: impl Into<PathBuf>, user_path: impl Into<PathBuf>) -> Self {
        Self {
            system_path: system_path.into(),
            user_path: user_path.into(),
        }
    }

    /// Read both prompts
    pub fn load(&self) -> Result<Prompts, ExtractorError> {
        Ok(Prompts {
            system: read_prompt(&self.system_path)?,
            user: read_prompt(&self.user_path)?,
        })
    }
}

fn read_prompt(path: &Path) -> Result<String, ExtractorError> {
    let text = fs::read_to_string(path).map_err(|source| ExtractorError::PromptUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), chars = text.len(), "Loaded prompt");
    Ok(text.trim().to_string())
}
