//! Splitting a record stream into fixed-size batches

use crate::error::{IndexerError, Result};
use crate::types::Article;

/// A contiguous, non-empty run of records submitted as one bulk request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    /// 1-based position of the batch within its stream
    pub number: usize,
    /// Records in stream order
    pub records: &'a [Article],
}

impl<'a> Batch<'a> {
    /// Wrap a slice of records as a batch
    pub fn new(number: usize, records: &'a [Article]) -> Self {
        Self { number, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of the first and last record, for log lines
    pub fn id_range(&self) -> Option<(&str, &str)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.id.as_str(), last.id.as_str()))
    }
}

/// Partition `records` into batches of at most `size` records.
///
/// Every batch except the last holds exactly `size` records, and the batches
/// concatenated in order give back `records`. An empty input yields no batches.
pub fn partition(records: &[Article], size: usize) -> Result<Vec<Batch<'_>>> {
    if size == 0 {
        return Err(IndexerError::InvalidConfiguration(
            "batch size must be at least 1".to_string(),
        ));
    }

    Ok(records
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| Batch::new(i + 1, chunk))
        .collect())
}
