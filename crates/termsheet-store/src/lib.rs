//! Termsheet Storage Layer
//!
//! Implements the `ExtractionStore` trait over SQLite.
//!
//! # Architecture
//!
//! - One summary row per extraction with derived scalars and the four raw
//!   JSON blobs of the extraction
//! - Normalized party, fee and pricing-rule rows owned by the summary row
//! - A job log recording every submission, written outside the extraction
//!   transaction
//!
//! # Examples
//!
//! ```no_run
//! use termsheet_store::SqliteStore;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! assert_eq!(store.count().unwrap(), 0);
//! ```

mod jobs;
mod mapper;
mod queries;

pub use jobs::JobStats;
pub use mapper::{normalize_name, parse_contract_date};
pub use queries::{ContractTypeSummary, ExtractionRecord, ExtractionSummary};

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use termsheet_domain::{ContractExtraction, ExtractionStore, JobRecord, RecordId};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON blob could not be written or read back
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// SQLite-based implementation of ExtractionStore
///
/// The connection sits behind a mutex, so one store can be shared across
/// concurrent submissions. Each write runs in its own transaction.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given database path
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use termsheet_store::SqliteStore;
    ///
    /// let store = SqliteStore::open("termsheet.db").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        info!(path = %path.as_ref().display(), "Opening extraction store");

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory extraction store");

        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.with_conn(|conn| Ok(conn.execute_batch(schema)?))
    }

    /// Run a read or single-statement operation on the connection
    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }

    /// Run an operation that needs a transaction
    pub(crate) fn with_conn_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&mut conn)
    }
}

impl ExtractionStore for SqliteStore {
    type Error = StoreError;

    fn persist(
        &self,
        extraction: &ContractExtraction,
        filename: &str,
        bytes: &[u8],
    ) -> Result<RecordId, Self::Error> {
        self.insert_extraction(extraction, filename, bytes)
    }

    fn find_by_hash(&self, hash: &str) -> Result<Option<RecordId>, Self::Error> {
        SqliteStore::find_by_hash(self, hash)
    }

    fn record_job(&self, job: &JobRecord) -> Result<i64, Self::Error> {
        self.insert_job(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        SqliteStore::open(&path).unwrap();
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = SqliteStore::open_in_memory().unwrap();
        let enabled: i64 = store
            .with_conn(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
