//! Delete command implementation.

use crate::cli::DeleteArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use termsheet_domain::RecordId;
use termsheet_store::SqliteStore;

/// Execute the delete command.
///
/// Deletes every id it can; fails afterwards if any id was unknown.
pub fn execute_delete(args: DeleteArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let mut missing = None;

    for id in args.ids {
        if store.delete(RecordId::from_value(id))? {
            println!("{}", formatter.success(&format!("Deleted extraction {}", id)));
        } else {
            println!("{}", formatter.warning(&format!("Extraction {} not found", id)));
            missing.get_or_insert(id);
        }
    }

    match missing {
        Some(id) => Err(CliError::NotFound(id)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use termsheet_domain::ExtractionStore;

    const FIXTURE: &str = include_str!("../../../../testdata/service_agreement.json");

    #[test]
    fn test_delete_reports_unknown_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let extraction = serde_json::from_str(FIXTURE).unwrap();
        let id = store.persist(&extraction, "msa.pdf", b"%PDF").unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);

        let result = execute_delete(DeleteArgs { ids: vec![id.value(), 99] }, &store, &formatter);
        assert!(matches!(result, Err(CliError::NotFound(99))));
        assert_eq!(store.count().unwrap(), 0);
    }
}
