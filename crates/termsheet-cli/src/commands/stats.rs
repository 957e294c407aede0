//! Stats command implementation.

use crate::error::Result;
use crate::output::Formatter;
use termsheet_store::SqliteStore;

/// Execute the stats command.
pub fn execute_stats(store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let total = store.count()?;
    let jobs = store.job_stats()?;
    let types = store.contract_type_summary()?;

    println!("{}", formatter.format_stats(total, &jobs, &types)?);

    Ok(())
}
