//! Coordinator that drives batches through build, submit and classify

use super::audit::{FailureEntry, FailureLog};
use super::batch::{partition, Batch};
use super::outcome::{BatchOutcome, BatchStatus, FailureStage, FileFailure, RunResult};
use super::progress::{BatchProgress, NoProgress, ProgressObserver, ProgressState};
use super::source::RecordSource;
use crate::bulk::{classify, BulkRequestBuilder, BulkTransport, DocumentEncoder, FailureReport, JsonEncoder};
use crate::config::{validate_index_name, DEFAULT_BATCH_SIZE, DEFAULT_INDEX_NAME};
use crate::error::{IndexerError, Result};
use crate::types::Article;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Tracing target for rejected documents, kept apart from the main log
pub const FAILED_ARTICLES_TARGET: &str = "failed_articles";

/// Where the records of the current batch came from
#[derive(Debug, Clone, Copy)]
struct FileContext<'p> {
    path: Option<&'p Path>,
    index: usize,
    total_files: usize,
    total_records: usize,
}

/// Indexes article batches one at a time through a bulk transport
pub struct IndexCoordinator {
    transport: Box<dyn BulkTransport>,
    encoder: Box<dyn DocumentEncoder>,
    observer: Box<dyn ProgressObserver>,
    failure_log: Option<FailureLog>,
    index_name: String,
    batch_size: usize,
    use_record_ids: bool,
    cancelled: Arc<AtomicBool>,
}

impl IndexCoordinator {
    /// Handle that stops the run at the next batch boundary when set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Index in-memory records into `index_name` in batches of `batch_size`.
    ///
    /// Batch failures are recorded in the result; configuration errors and
    /// backend protocol violations are returned.
    pub fn index_all(&mut self, index_name: &str, records: &[Article], batch_size: usize) -> Result<RunResult> {
        check_index_name(index_name)?;
        let batches = partition(records, batch_size)?;

        let mut state = ProgressState::new();
        let mut result = RunResult::default();
        let ctx = FileContext {
            path: None,
            index: 1,
            total_files: 1,
            total_records: records.len(),
        };

        self.observer.file_started(None, 1, 1, records.len());
        if let Err(e) = self.run_batches(index_name, &batches, ctx, &mut state, &mut result) {
            self.observer.run_aborted(&e);
            return Err(e);
        }
        if !result.cancelled {
            state.file_done();
        }

        Ok(self.finish(state, result))
    }

    /// Read and index each file in turn.
    ///
    /// A file that fails to parse is recorded and skipped; the run moves on to
    /// the next file.
    pub fn index_files(
        &mut self,
        index_name: &str,
        paths: &[PathBuf],
        source: &dyn RecordSource,
        batch_size: usize,
    ) -> Result<RunResult> {
        check_index_name(index_name)?;
        if batch_size == 0 {
            return Err(IndexerError::InvalidConfiguration(
                "batch size must be at least 1".to_string(),
            ));
        }

        info!("Indexing {} files into '{}'", paths.len(), index_name);

        let mut state = ProgressState::new();
        let mut result = RunResult::default();

        for (i, path) in paths.iter().enumerate() {
            if self.is_cancelled() {
                info!("Indexing cancelled before {}", path.display());
                result.cancelled = true;
                break;
            }

            let records = match source.read_all(path) {
                Ok(records) => records,
                Err(e) => {
                    error!("There was an error reading the file {}: {}", path.display(), e);
                    result.files_failed += 1;
                    result.file_failures.push(FileFailure {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let batches = partition(&records, batch_size)?;
            let ctx = FileContext {
                path: Some(path.as_path()),
                index: i + 1,
                total_files: paths.len(),
                total_records: records.len(),
            };

            self.observer.file_started(Some(path.as_path()), ctx.index, ctx.total_files, records.len());
            if let Err(e) = self.run_batches(index_name, &batches, ctx, &mut state, &mut result) {
                self.observer.run_aborted(&e);
                return Err(e);
            }

            if result.cancelled {
                break;
            }
            state.file_done();
        }

        Ok(self.finish(state, result))
    }

    /// Index the files with the configured index name and batch size
    pub fn run(&mut self, paths: &[PathBuf], source: &dyn RecordSource) -> Result<RunResult> {
        let index_name = self.index_name.clone();
        let batch_size = self.batch_size;
        self.index_files(&index_name, paths, source, batch_size)
    }

    fn run_batches(
        &mut self,
        index_name: &str,
        batches: &[Batch<'_>],
        ctx: FileContext<'_>,
        state: &mut ProgressState,
        result: &mut RunResult,
    ) -> Result<()> {
        let mut records_in_file = 0;

        for batch in batches {
            if self.is_cancelled() {
                info!("Indexing cancelled before batch {}", batch.number);
                result.cancelled = true;
                return Ok(());
            }

            let outcome = self.process_batch(index_name, batch, ctx.path)?;

            records_in_file += batch.len();
            state.batch_done(batch.len());
            result.records_attempted += outcome.size;
            result.records_indexed += outcome.indexed;
            if !outcome.is_completed() {
                result.batches_failed += 1;
            }
            result.batches.push(outcome);

            self.observer.batch_finished(&BatchProgress {
                file_index: ctx.index,
                total_files: ctx.total_files,
                records_in_file,
                total_records_in_file: ctx.total_records,
            });
        }

        Ok(())
    }

    /// Pending -> Built -> Submitted -> Classified -> Completed, or Failed at
    /// the build or transport step
    fn process_batch(&mut self, index_name: &str, batch: &Batch<'_>, file: Option<&Path>) -> Result<BatchOutcome> {
        let (first_id, last_id) = batch.id_range().unwrap_or(("", ""));

        let built = BulkRequestBuilder::new(self.encoder.as_ref())
            .with_record_ids(self.use_record_ids)
            .build(index_name, batch);
        let request = match built {
            Ok(request) => request,
            Err(e) => {
                error!("There was an error encoding the batch {} -> {}: {}", first_id, last_id, e);
                return Ok(self.batch_failed(index_name, batch, file, FailureStage::Build, e.to_string()));
            }
        };

        let submitted = self.transport.submit_request(&request);
        let response = match submitted {
            Ok(response) => response,
            Err(e) => {
                error!("There was an error indexing the batch {} -> {}: {}", first_id, last_id, e);
                return Ok(self.batch_failed(index_name, batch, file, FailureStage::Transport, e.to_string()));
            }
        };

        let report = match classify(&response, batch) {
            Ok(report) => report,
            Err(IndexerError::ProtocolMismatch { expected, actual, .. }) => {
                return Err(self.protocol_mismatch(index_name, batch, file, expected, actual));
            }
            Err(e) => return Err(e),
        };
        if !report.is_empty() {
            self.documents_rejected(index_name, batch, file, &report);
        }

        debug!(
            "Batch {} completed: {}/{} indexed in {}ms",
            batch.number,
            batch.len() - report.len(),
            batch.len(),
            response.took
        );

        Ok(BatchOutcome {
            file: file.map(Path::to_path_buf),
            number: batch.number,
            size: batch.len(),
            indexed: batch.len() - report.len(),
            status: BatchStatus::Completed { report },
        })
    }

    fn batch_failed(
        &mut self,
        index_name: &str,
        batch: &Batch<'_>,
        file: Option<&Path>,
        stage: FailureStage,
        error: String,
    ) -> BatchOutcome {
        self.audit(FailureEntry {
            timestamp: Utc::now(),
            index: index_name.to_string(),
            file: file.map(Path::to_path_buf),
            batch: batch.number,
            stage: Some(stage),
            failed_ids: batch.records.iter().map(|a| a.id.clone()).collect(),
            message: error.clone(),
        });

        BatchOutcome {
            file: file.map(Path::to_path_buf),
            number: batch.number,
            size: batch.len(),
            indexed: 0,
            status: BatchStatus::Failed { stage, error },
        }
    }

    /// Audit a batch whose response cannot be paired with its records and
    /// build the error that ends the run
    fn protocol_mismatch(
        &mut self,
        index_name: &str,
        batch: &Batch<'_>,
        file: Option<&Path>,
        expected: usize,
        actual: usize,
    ) -> IndexerError {
        let err = IndexerError::ProtocolMismatch {
            file: file.map(Path::to_path_buf),
            batch: batch.number,
            expected,
            actual,
        };
        error!(target: FAILED_ARTICLES_TARGET, "Aborting run: {}", err);

        self.audit(FailureEntry {
            timestamp: Utc::now(),
            index: index_name.to_string(),
            file: file.map(Path::to_path_buf),
            batch: batch.number,
            stage: Some(FailureStage::Protocol),
            failed_ids: batch.records.iter().map(|a| a.id.clone()).collect(),
            message: err.to_string(),
        });

        err
    }

    fn documents_rejected(&mut self, index_name: &str, batch: &Batch<'_>, file: Option<&Path>, report: &FailureReport) {
        let message = report.message.clone().unwrap_or_default();
        error!(
            target: FAILED_ARTICLES_TARGET,
            "There was an error indexing this batch: {}\nThe failures occurred in the article(s) with Id: {:?}",
            message,
            report.failed_ids
        );

        match self.failure_log {
            Some(ref log) => warn!(
                "Some articles were not indexed properly. Consult {} for more information.",
                log.path().display()
            ),
            None => warn!("{} articles of batch {} were not indexed properly", report.len(), batch.number),
        }

        self.audit(FailureEntry {
            timestamp: Utc::now(),
            index: index_name.to_string(),
            file: file.map(Path::to_path_buf),
            batch: batch.number,
            stage: None,
            failed_ids: report.failed_ids.clone(),
            message,
        });
    }

    fn audit(&mut self, entry: FailureEntry) {
        if let Some(ref mut log) = self.failure_log {
            if let Err(e) = log.record(&entry) {
                warn!("Failed to write failure log {}: {}", log.path().display(), e);
            }
        }
    }

    fn finish(&mut self, state: ProgressState, mut result: RunResult) -> RunResult {
        result.files_processed = state.files_processed;
        result.batches_processed = state.batches_processed;
        result.elapsed_seconds = state.elapsed_seconds();
        debug_assert_eq!(state.records_processed, result.records_attempted);

        info!(
            "Indexed {}/{} articles in {} batches ({} failed) from {} files ({} unreadable)",
            result.records_indexed,
            result.records_attempted,
            result.batches_processed,
            result.batches_failed,
            result.files_processed,
            result.files_failed
        );

        self.observer.run_finished(&result);
        result
    }
}

fn check_index_name(name: &str) -> Result<()> {
    validate_index_name(name).map_err(IndexerError::InvalidConfiguration)
}

/// Builder for IndexCoordinator with sensible defaults
pub struct IndexCoordinatorBuilder {
    transport: Option<Box<dyn BulkTransport>>,
    encoder: Box<dyn DocumentEncoder>,
    observer: Box<dyn ProgressObserver>,
    failure_log: Option<PathBuf>,
    index_name: String,
    batch_size: usize,
    use_record_ids: bool,
}

impl IndexCoordinatorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            transport: None,
            encoder: Box::new(JsonEncoder),
            observer: Box::new(NoProgress),
            failure_log: None,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            use_record_ids: false,
        }
    }

    /// Set the bulk transport (required)
    pub fn with_transport(mut self, transport: impl BulkTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Set the document encoder
    pub fn with_encoder(mut self, encoder: impl DocumentEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    /// Set the progress observer
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Append rejected ids and failed batches to this file
    pub fn with_failure_log(mut self, path: Option<impl AsRef<Path>>) -> Self {
        self.failure_log = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Set the destination index
    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    /// Set batch size
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Use article ids as document ids
    pub fn with_record_ids(mut self, use_record_ids: bool) -> Self {
        self.use_record_ids = use_record_ids;
        self
    }

    /// Build the coordinator
    pub fn build(self) -> Result<IndexCoordinator> {
        let transport = self.transport.ok_or_else(|| {
            IndexerError::InvalidConfiguration("A bulk transport is required. Call with_transport() first.".into())
        })?;

        check_index_name(&self.index_name)?;
        if self.batch_size == 0 {
            return Err(IndexerError::InvalidConfiguration(
                "batch size must be at least 1".to_string(),
            ));
        }

        let failure_log = self.failure_log.map(FailureLog::open).transpose()?;

        Ok(IndexCoordinator {
            transport,
            encoder: self.encoder,
            observer: self.observer,
            failure_log,
            index_name: self.index_name,
            batch_size: self.batch_size,
            use_record_ids: self.use_record_ids,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl Default for IndexCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
