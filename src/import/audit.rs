//! Append-only audit log of documents and batches that were not indexed
//!
//! One JSON object per line, so a later job can pick the ids up for a retry.

use super::outcome::FailureStage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One audit line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub timestamp: DateTime<Utc>,
    pub index: String,
    pub file: Option<PathBuf>,
    pub batch: usize,
    /// Set when the whole batch failed; absent for per-document rejections
    pub stage: Option<FailureStage>,
    /// Rejected ids, or every id of a failed batch
    pub failed_ids: Vec<String>,
    pub message: String,
}

/// Writer for the audit file
pub struct FailureLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FailureLog {
    /// Open (or create) the log in append mode
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush it to disk
    pub fn record(&mut self, entry: &FailureEntry) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    /// Read back all entries of a log file
    pub fn read_entries(path: impl AsRef<Path>) -> io::Result<Vec<FailureEntry>> {
        let content = std::fs::read_to_string(path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(io::Error::from))
            .collect()
    }
}
