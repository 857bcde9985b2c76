//! Progress tracking for indexing runs

use super::outcome::RunResult;
use crate::error::IndexerError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Running counters for one run, owned by the coordinator
#[derive(Debug, Clone)]
pub struct ProgressState {
    pub files_processed: usize,
    pub batches_processed: usize,
    pub records_processed: usize,
    start_time: Instant,
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            files_processed: 0,
            batches_processed: 0,
            records_processed: 0,
            start_time: Instant::now(),
        }
    }

    /// Count a finished batch of `records` records
    pub fn batch_done(&mut self, records: usize) {
        self.batches_processed += 1;
        self.records_processed += records;
    }

    pub fn file_done(&mut self) {
        self.files_processed += 1;
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

/// One progress observation, emitted after every batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based index of the current file
    pub file_index: usize,
    pub total_files: usize,
    /// Records of the current file handled so far, including this batch
    pub records_in_file: usize,
    pub total_records_in_file: usize,
}

/// Receives progress observations; never influences control flow
pub trait ProgressObserver {
    /// A file was read and is about to be indexed
    fn file_started(&mut self, _path: Option<&Path>, _file_index: usize, _total_files: usize, _total_records: usize) {}

    /// A batch finished (completed or failed)
    fn batch_finished(&mut self, progress: &BatchProgress);

    /// The run is over
    fn run_finished(&mut self, _result: &RunResult) {}

    /// The run stopped on an error; `run_finished` is not called
    fn run_aborted(&mut self, _error: &IndexerError) {}
}

/// Observer that drops every observation
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn batch_finished(&mut self, _progress: &BatchProgress) {}
}

/// Logs each batch and, unless quiet, drives a terminal progress bar per file
pub struct ConsoleProgress {
    progress_bar: Option<ProgressBar>,
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            progress_bar: None,
            quiet,
        }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn file_started(&mut self, path: Option<&Path>, file_index: usize, total_files: usize, total_records: usize) {
        if let Some(path) = path {
            info!("Processing file {} ({}/{})", path.display(), file_index, total_files);
        }

        if self.quiet {
            return;
        }

        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }

        let pb = ProgressBar::new(total_records as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(format!("file {}/{}", file_index, total_files));
        self.progress_bar = Some(pb);
    }

    fn batch_finished(&mut self, progress: &BatchProgress) {
        info!(
            "File {}/{} -> {}/{}",
            progress.file_index,
            progress.total_files,
            progress.records_in_file,
            progress.total_records_in_file
        );

        if let Some(ref pb) = self.progress_bar {
            pb.set_position(progress.records_in_file as u64);
        }
    }

    fn run_finished(&mut self, result: &RunResult) {
        if let Some(pb) = self.progress_bar.take() {
            let message = if result.cancelled {
                "Cancelled".to_string()
            } else {
                format!(
                    "Done! {}/{} indexed, {} failed batches, {:.1} docs/s",
                    result.records_indexed,
                    result.records_attempted,
                    result.batches_failed,
                    result.rate()
                )
            };
            if result.cancelled {
                pb.abandon_with_message(message);
            } else {
                pb.finish_with_message(message);
            }
        }
    }

    fn run_aborted(&mut self, error: &IndexerError) {
        if let Some(pb) = self.progress_bar.take() {
            pb.abandon_with_message(format!("Aborted: {}", error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_state_counts() {
        let mut state = ProgressState::new();
        state.batch_done(100);
        state.batch_done(50);
        state.file_done();

        assert_eq!(state.batches_processed, 2);
        assert_eq!(state.records_processed, 150);
        assert_eq!(state.files_processed, 1);
        assert!(state.elapsed_seconds() >= 0.0);
    }

    #[test]
    fn test_quiet_console_progress_has_no_bar() {
        let mut progress = ConsoleProgress::new(true);
        progress.file_started(None, 1, 1, 10);
        progress.batch_finished(&BatchProgress {
            file_index: 1,
            total_files: 1,
            records_in_file: 10,
            total_records_in_file: 10,
        });
        assert!(progress.progress_bar.is_none());
        progress.run_finished(&RunResult::default());
    }

    #[test]
    fn test_aborted_run_releases_the_bar() {
        let mut progress = ConsoleProgress::new(false);
        progress.file_started(None, 1, 1, 4);
        assert!(progress.progress_bar.is_some());

        progress.run_aborted(&IndexerError::ProtocolMismatch {
            file: None,
            batch: 2,
            expected: 2,
            actual: 1,
        });
        assert!(progress.progress_bar.is_none());
    }
}
