//! Hash command implementation.

use crate::cli::HashArgs;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;
use serde_json::json;
use std::fs;
use termsheet_domain::content_hash;
use termsheet_store::SqliteStore;

/// Execute the hash command.
pub fn execute_hash(args: HashArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let bytes = fs::read(&args.file)?;
    let hash = content_hash(&bytes);
    let existing = store.find_by_hash(&hash)?;

    match formatter.format() {
        OutputFormat::Json => {
            let value = json!({
                "file": args.file.display().to_string(),
                "sha256": hash,
                "size": bytes.len(),
                "existing_extraction": existing.map(|id| id.value()),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Quiet => println!("{}", hash),
        OutputFormat::Table => {
            println!("{}  {}", hash, args.file.display());
            match existing {
                Some(id) => println!("{}", formatter.info(&format!("Already extracted as {}", id))),
                None => println!("{}", formatter.info("Not extracted yet")),
            }
        }
    }

    Ok(())
}
