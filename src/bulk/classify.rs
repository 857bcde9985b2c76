//! Attributing bulk item failures back to the records that caused them

use super::response::BulkResponse;
use crate::error::{IndexerError, Result};
use crate::import::Batch;
use crate::types::ArticleId;
use serde::{Deserialize, Serialize};

/// Records of one batch that the backend rejected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Ids of rejected records, in batch order
    pub failed_ids: Vec<ArticleId>,
    /// Backend diagnostic for the whole batch
    pub message: Option<String>,
}

impl FailureReport {
    pub fn is_empty(&self) -> bool {
        self.failed_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failed_ids.len()
    }
}

/// Pair `response.items[i]` with `batch.records[i]` and collect the ids of
/// failed items.
///
/// A length mismatch means the backend broke the bulk contract and is returned
/// as `ProtocolMismatch`. The classifier does not know the source file; the
/// coordinator fills it in.
pub fn classify(response: &BulkResponse, batch: &Batch<'_>) -> Result<FailureReport> {
    if response.len() != batch.len() {
        return Err(IndexerError::ProtocolMismatch {
            file: None,
            batch: batch.number,
            expected: batch.len(),
            actual: response.len(),
        });
    }

    if !response.has_failures() {
        return Ok(FailureReport::default());
    }

    let failed_ids = response
        .items
        .iter()
        .zip(batch.records)
        .filter(|(item, _)| item.is_failure())
        .map(|(_, article)| article.id.clone())
        .collect();

    Ok(FailureReport {
        failed_ids,
        message: response.failure_message(),
    })
}
