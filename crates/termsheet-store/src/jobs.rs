//! Submission job log

use crate::{SqliteStore, StoreError};
use chrono::Utc;
use rusqlite::params;
use serde::Serialize;
use termsheet_domain::JobRecord;
use tracing::debug;

/// Aggregate over the job log
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobStats {
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub failed_jobs: i64,
    /// Mean processing time of completed jobs, if any
    pub avg_processing_seconds: Option<f64>,
    /// Mean model calls per job
    pub avg_attempts: Option<f64>,
}

impl SqliteStore {
    /// Append one job row in its own statement
    pub(crate) fn insert_job(&self, job: &JobRecord) -> Result<i64, StoreError> {
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO extraction_jobs (
                    contract_extraction_id, file_name, file_size, file_hash,
                    processing_status, processing_started_at, processing_completed_at,
                    processing_error, processing_time_seconds,
                    remote_file_id, model_used, attempts, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    job.extraction_id.map(|id| id.value()),
                    job.file_name,
                    job.file_size as i64,
                    job.file_hash,
                    job.status.as_str(),
                    job.started_at,
                    job.finished_at,
                    job.error_message,
                    job.processing_seconds(),
                    job.remote_file_id,
                    job.model,
                    job.attempts,
                    Utc::now(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(job_id = id, status = job.status.as_str(), "Recorded extraction job");
        Ok(id)
    }

    /// Summarise the job log
    pub fn job_stats(&self) -> Result<JobStats, StoreError> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN processing_status = 'completed' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN processing_status = 'failed' THEN 1 ELSE 0 END), 0),
                        AVG(CASE WHEN processing_status = 'completed' THEN processing_time_seconds END),
                        AVG(attempts)
                 FROM extraction_jobs",
                [],
                |row| {
                    Ok(JobStats {
                        total_jobs: row.get(0)?,
                        completed_jobs: row.get(1)?,
                        failed_jobs: row.get(2)?,
                        avg_processing_seconds: row.get(3)?,
                        avg_attempts: row.get(4)?,
                    })
                },
            )?)
        })
    }

    /// Extraction linked from a job row, if the extraction still exists
    ///
    /// Fails if the job row does not exist.
    pub fn job_extraction(&self, job_id: i64) -> Result<Option<i64>, StoreError> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT contract_extraction_id FROM extraction_jobs WHERE id = ?1",
                params![job_id],
                |row| row.get(0),
            )?)
        })
    }
}
