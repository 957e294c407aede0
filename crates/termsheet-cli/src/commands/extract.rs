//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::{Config, OutputFormat};
use crate::error::{CliError, Result};
use crate::output::{FileReport, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use termsheet_domain::{ExtractionStore, ModelService};
use termsheet_extractor::{render_summary, ArtifactWriter, Extractor, Pipeline, Submission};
use termsheet_llm::OpenAiService;
use tokio::sync::Semaphore;
use tracing::info;

/// Outcome of one file in a batch
pub type FileOutcome = (PathBuf, std::result::Result<Submission, String>);

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &mut Config, formatter: &Formatter) -> Result<()> {
    args.apply_to(config);

    let extractor_config = config.extractor_config();
    extractor_config.validate().map_err(CliError::Config)?;
    if config.extraction.concurrency == 0 {
        return Err(CliError::InvalidInput("Concurrency must be at least 1".to_string()));
    }

    let mut service = OpenAiService::new(config.api_key()?)?;
    if let Some(base_url) = &config.model.base_url {
        service = service.with_base_url(base_url.as_str());
    }
    let store = config.storage.open_store()?;

    let pipeline = Pipeline::new(Extractor::new(service, extractor_config), store)
        .with_artifacts(ArtifactWriter::new(&config.output.directory))
        .skip_duplicates(config.extraction.skip_duplicates);

    let total = args.files.len();
    info!(total, concurrency = config.extraction.concurrency, "Starting batch");
    let outcomes = run_batch(Arc::new(pipeline), args.files, config.extraction.concurrency).await;

    if !args.quiet && formatter.format() == OutputFormat::Table {
        for (_, outcome) in &outcomes {
            if let Ok(Submission::Extracted { extraction, .. }) = outcome {
                println!("{}", render_summary(extraction));
            }
        }
    }

    let reports: Vec<FileReport> = outcomes.iter().map(file_report).collect();
    println!("{}", formatter.format_batch(&reports)?);

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(CliError::BatchFailed { failed, total });
    }
    Ok(())
}

/// Submit every file through the pipeline, at most `concurrency` at a time.
///
/// Outcomes are returned in input order.
pub async fn run_batch<M, S>(pipeline: Arc<Pipeline<M, S>>, files: Vec<PathBuf>, concurrency: usize) -> Vec<FileOutcome>
where
    M: ModelService + 'static,
    S: ExtractionStore + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let pipeline = Arc::clone(&pipeline);
            let semaphore = Arc::clone(&semaphore);
            let task_path = path.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| e.to_string())?;
                submit_file(&pipeline, &task_path).await
            });
            (path, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let outcome = handle
            .await
            .unwrap_or_else(|e| Err(format!("extraction task failed: {}", e)));
        outcomes.push((path, outcome));
    }
    outcomes
}

async fn submit_file<M, S>(pipeline: &Pipeline<M, S>, path: &Path) -> std::result::Result<Submission, String>
where
    M: ModelService + 'static,
    S: ExtractionStore,
{
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    pipeline.submit(&bytes, &filename).await.map_err(|e| e.to_string())
}

fn file_report((path, outcome): &FileOutcome) -> FileReport {
    let file = path.display().to_string();
    match outcome {
        Ok(Submission::Extracted {
            record_id,
            attempts,
            artifact,
            ..
        }) => FileReport {
            file,
            record_id: Some(record_id.value()),
            duplicate: false,
            attempts: *attempts,
            artifact: artifact.as_ref().map(|p| p.display().to_string()),
            error: None,
        },
        Ok(Submission::Duplicate { record_id, .. }) => FileReport {
            file,
            record_id: Some(record_id.value()),
            duplicate: true,
            attempts: 0,
            artifact: None,
            error: None,
        },
        Err(error) => FileReport {
            file,
            record_id: None,
            duplicate: false,
            attempts: 0,
            artifact: None,
            error: Some(error.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use termsheet_extractor::ExtractorConfig;
    use termsheet_llm::MockModelService;
    use termsheet_store::SqliteStore;

    const FIXTURE: &str = include_str!("../../../../testdata/service_agreement.json");

    fn pipeline(dir: &Path, service: MockModelService) -> Arc<Pipeline<MockModelService, SqliteStore>> {
        let system_prompt_path = dir.join("system_prompt.md");
        let user_prompt_path = dir.join("user_prompt.md");
        fs::write(&system_prompt_path, "system").unwrap();
        fs::write(&user_prompt_path, "user").unwrap();

        let config = ExtractorConfig {
            retry_backoff_ms: 0,
            system_prompt_path,
            user_prompt_path,
            ..ExtractorConfig::default()
        };
        Arc::new(
            Pipeline::new(Extractor::new(service, config), SqliteStore::open_in_memory().unwrap())
                .with_artifacts(ArtifactWriter::new(dir.join("outputs"))),
        )
    }

    #[tokio::test]
    async fn test_batch_reports_each_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockModelService::new(FIXTURE);
        let pipeline = pipeline(dir.path(), service.clone());

        let good = dir.path().join("good.pdf");
        let other = dir.path().join("other.PDF");
        let wrong = dir.path().join("notes.txt");
        let missing = dir.path().join("missing.pdf");
        fs::write(&good, b"%PDF-1.7 one").unwrap();
        fs::write(&other, b"%PDF-1.7 two").unwrap();
        fs::write(&wrong, b"text").unwrap();

        let files = vec![good.clone(), wrong.clone(), missing.clone(), other.clone()];
        let outcomes = run_batch(Arc::clone(&pipeline), files, 2).await;

        let paths: Vec<_> = outcomes.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(paths, vec![good, wrong, missing, other]);

        assert!(outcomes[0].1.is_ok());
        assert!(outcomes[1].1.as_ref().unwrap_err().contains("Unsupported file"));
        assert!(outcomes[2].1.as_ref().unwrap_err().contains("Cannot read"));
        assert!(outcomes[3].1.is_ok());

        assert_eq!(pipeline.store().count().unwrap(), 2);
        assert_eq!(service.upload_count(), 2);

        let reports: Vec<_> = outcomes.iter().map(file_report).collect();
        assert_eq!(reports.iter().filter(|r| r.error.is_some()).count(), 2);
        assert!(reports[0].artifact.as_deref().unwrap().ends_with("_good_extraction.json"));
    }

    #[tokio::test]
    async fn test_batch_with_duplicates_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let service = MockModelService::new(FIXTURE);
        let system_prompt_path = dir.path().join("s.md");
        let user_prompt_path = dir.path().join("u.md");
        fs::write(&system_prompt_path, "system").unwrap();
        fs::write(&user_prompt_path, "user").unwrap();
        let config = ExtractorConfig {
            retry_backoff_ms: 0,
            system_prompt_path,
            user_prompt_path,
            ..ExtractorConfig::default()
        };
        let pipeline = Arc::new(
            Pipeline::new(Extractor::new(service.clone(), config), SqliteStore::open_in_memory().unwrap())
                .skip_duplicates(true),
        );

        let first = dir.path().join("a.pdf");
        fs::write(&first, b"%PDF-1.7 same").unwrap();
        run_batch(Arc::clone(&pipeline), vec![first.clone()], 1).await;

        let copy = dir.path().join("b.pdf");
        fs::write(&copy, b"%PDF-1.7 same").unwrap();
        let outcomes = run_batch(Arc::clone(&pipeline), vec![copy], 1).await;

        let report = file_report(&outcomes[0]);
        assert!(report.duplicate);
        assert_eq!(service.complete_count(), 1);
    }
}
