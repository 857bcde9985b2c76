//! Per-batch outcomes and the aggregated run result

use crate::bulk::FailureReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where a failed batch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// The payload could not be built; nothing was sent
    Build,
    /// The payload was built but the backend could not be reached or answered badly
    Transport,
    /// The backend answered with a different number of items than were sent;
    /// which records were indexed is unknown
    Protocol,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchStatus {
    /// Submitted and classified; `report` lists any rejected documents
    Completed { report: FailureReport },
    /// Nothing from the batch was indexed
    Failed { stage: FailureStage, error: String },
}

/// Result of processing one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Source file, when the batch came from one
    pub file: Option<PathBuf>,
    /// 1-based batch number within its file
    pub number: usize,
    /// Records in the batch
    pub size: usize,
    /// Records the backend confirmed
    pub indexed: usize,
    pub status: BatchStatus,
}

impl BatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, BatchStatus::Completed { .. })
    }

    /// Failure report of a completed batch
    pub fn report(&self) -> Option<&FailureReport> {
        match &self.status {
            BatchStatus::Completed { report } => Some(report),
            BatchStatus::Failed { .. } => None,
        }
    }

    /// Stage at which a failed batch stopped
    pub fn failure_stage(&self) -> Option<FailureStage> {
        match &self.status {
            BatchStatus::Completed { .. } => None,
            BatchStatus::Failed { stage, .. } => Some(*stage),
        }
    }
}

/// A file that could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Everything a run did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Files whose records were read and batched
    pub files_processed: usize,
    /// Files that failed to parse
    pub files_failed: usize,
    /// Batches attempted, including failed ones
    pub batches_processed: usize,
    pub batches_failed: usize,
    /// Records handed to the pipeline
    pub records_attempted: usize,
    /// Records the backend confirmed
    pub records_indexed: usize,
    /// True when the run stopped early on a cancellation request
    pub cancelled: bool,
    pub elapsed_seconds: f64,
    /// One entry per batch, in processing order
    pub batches: Vec<BatchOutcome>,
    pub file_failures: Vec<FileFailure>,
}

impl RunResult {
    /// Failure reports of every completed batch that had rejected documents
    pub fn failure_reports(&self) -> impl Iterator<Item = &FailureReport> {
        self.batches
            .iter()
            .filter_map(BatchOutcome::report)
            .filter(|report| !report.is_empty())
    }

    /// Ids of every document the backend rejected
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failure_reports()
            .flat_map(|report| report.failed_ids.iter().map(String::as_str))
            .collect()
    }

    /// Batches that failed before any document was indexed
    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| !b.is_completed())
    }

    /// True when every batch completed and no document was rejected
    pub fn is_clean(&self) -> bool {
        self.files_failed == 0 && self.records_indexed == self.records_attempted && !self.cancelled
    }

    /// Documents per second over the run
    pub fn rate(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.records_indexed as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(number: usize, size: usize, failed: &[&str]) -> BatchOutcome {
        BatchOutcome {
            file: None,
            number,
            size,
            indexed: size - failed.len(),
            status: BatchStatus::Completed {
                report: FailureReport {
                    failed_ids: failed.iter().map(|s| s.to_string()).collect(),
                    message: (!failed.is_empty()).then(|| "failure in bulk execution:".to_string()),
                },
            },
        }
    }

    #[test]
    fn test_failed_ids_skip_clean_and_failed_batches() {
        let result = RunResult {
            batches: vec![
                completed(1, 2, &[]),
                completed(2, 3, &["x", "y"]),
                BatchOutcome {
                    file: None,
                    number: 3,
                    size: 4,
                    indexed: 0,
                    status: BatchStatus::Failed {
                        stage: FailureStage::Transport,
                        error: "connection refused".to_string(),
                    },
                },
            ],
            ..RunResult::default()
        };

        assert_eq!(result.failure_reports().count(), 1);
        assert_eq!(result.failed_ids(), vec!["x", "y"]);
        assert_eq!(result.failed_batches().count(), 1);
        assert_eq!(result.batches[2].failure_stage(), Some(FailureStage::Transport));
    }

    #[test]
    fn test_batch_status_serializes_with_tag() {
        let outcome = BatchOutcome {
            file: None,
            number: 1,
            size: 1,
            indexed: 0,
            status: BatchStatus::Failed {
                stage: FailureStage::Build,
                error: "bad".to_string(),
            },
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"]["status"], "failed");
        assert_eq!(value["status"]["stage"], "build");
    }
}
