//! Show command implementation.

use crate::cli::ShowArgs;
use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use termsheet_domain::RecordId;
use termsheet_extractor::render_summary;
use termsheet_store::SqliteStore;

/// Execute the show command.
pub fn execute_show(args: ShowArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let id = RecordId::from_value(args.id);
    let record = store.get(id)?.ok_or(CliError::NotFound(args.id))?;

    println!("{}", formatter.format_record(&record)?);

    if formatter.format() == OutputFormat::Table {
        if let Some(extraction) = store.load_extraction(id)? {
            println!("{}", render_summary(&extraction));
        }
    }

    Ok(())
}
