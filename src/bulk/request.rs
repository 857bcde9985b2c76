//! Building bulk write requests from batches

use crate::error::SerializationError;
use crate::import::Batch;
use crate::types::Article;
use serde_json::json;

/// Encodes one article into the document body sent to the index
pub trait DocumentEncoder: Send + Sync {
    fn encode(&self, article: &Article) -> Result<String, SerializationError>;
}

/// Default encoder: the article's serde JSON form
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl DocumentEncoder for JsonEncoder {
    fn encode(&self, article: &Article) -> Result<String, SerializationError> {
        serde_json::to_string(article).map_err(|e| SerializationError {
            record_id: article.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// One index action: optional explicit `_id` plus the encoded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkAction {
    pub document_id: Option<String>,
    pub source: String,
}

/// An ordered set of index actions against a single index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    index: String,
    actions: Vec<BulkAction>,
}

impl BulkRequest {
    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn actions(&self) -> &[BulkAction] {
        &self.actions
    }

    /// Number of actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Render the `_bulk` body: an action line and a source line per action,
    /// newline terminated.
    pub fn to_ndjson(&self) -> String {
        let mut body = String::with_capacity(
            self.actions.iter().map(|a| a.source.len() + 64).sum::<usize>(),
        );

        for action in &self.actions {
            let meta = match &action.document_id {
                Some(id) => json!({ "index": { "_index": self.index, "_id": id } }),
                None => json!({ "index": { "_index": self.index } }),
            };
            body.push_str(&meta.to_string());
            body.push('\n');
            body.push_str(&action.source);
            body.push('\n');
        }

        body
    }
}

/// Builds bulk requests with a chosen encoder
pub struct BulkRequestBuilder<'e> {
    encoder: &'e dyn DocumentEncoder,
    use_record_ids: bool,
}

impl<'e> BulkRequestBuilder<'e> {
    pub fn new(encoder: &'e dyn DocumentEncoder) -> Self {
        Self {
            encoder,
            use_record_ids: false,
        }
    }

    /// Send each article's id as the document `_id` instead of letting the
    /// backend assign one
    pub fn with_record_ids(mut self, use_record_ids: bool) -> Self {
        self.use_record_ids = use_record_ids;
        self
    }

    /// Build the request for `batch`.
    ///
    /// Fails on the first record that cannot be encoded; no partial request is
    /// ever returned.
    pub fn build(&self, index: &str, batch: &Batch<'_>) -> Result<BulkRequest, SerializationError> {
        let actions = batch
            .records
            .iter()
            .map(|article| {
                let source = self.encoder.encode(article)?;
                Ok(BulkAction {
                    document_id: self.use_record_ids.then(|| article.id.clone()),
                    source,
                })
            })
            .collect::<Result<Vec<_>, SerializationError>>()?;

        Ok(BulkRequest {
            index: index.to_string(),
            actions,
        })
    }
}

/// Build a request with the default JSON encoder and backend-assigned ids
pub fn build(index: &str, batch: &Batch<'_>) -> Result<BulkRequest, SerializationError> {
    BulkRequestBuilder::new(&JsonEncoder).build(index, batch)
}
