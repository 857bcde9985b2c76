//! Bulk responses and their wire format

use crate::error::TransportError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Error attached to a rejected bulk item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Backend error type, e.g. `mapper_parsing_exception`
    pub error_type: String,
    pub reason: String,
}

/// Outcome of one action in a bulk request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    /// Index the action targeted
    pub index: String,
    /// Document id assigned (or echoed) by the backend
    pub id: Option<String>,
    pub status: u16,
    /// `created`, `updated`, ... on success
    pub result: Option<String>,
    pub error: Option<ItemError>,
}

impl BulkItem {
    /// A successful item with a backend-assigned id
    pub fn success(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: Some(id.into()),
            status: 201,
            result: Some("created".to_string()),
            error: None,
        }
    }

    /// A rejected item
    pub fn failure(
        index: impl Into<String>,
        status: u16,
        error_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            index: index.into(),
            id: None,
            status,
            result: None,
            error: Some(ItemError {
                error_type: error_type.into(),
                reason: reason.into(),
            }),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Structured result of one bulk submission; items pair with request actions
/// by position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResponse {
    /// Backend processing time in milliseconds
    pub took: u64,
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    pub fn new(items: Vec<BulkItem>) -> Self {
        Self { took: 0, items }
    }

    /// Total number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        self.items.iter().any(BulkItem::is_failure)
    }

    /// Diagnostic covering every failed item, `None` when all succeeded
    pub fn failure_message(&self) -> Option<String> {
        if !self.has_failures() {
            return None;
        }

        let mut message = String::from("failure in bulk execution:");
        for (i, item) in self.items.iter().enumerate() {
            if let Some(ref error) = item.error {
                let _ = write!(
                    message,
                    "\n[{}]: index [{}], id [{}], message [type={}, reason={}]",
                    i,
                    item.index,
                    item.id.as_deref().unwrap_or(""),
                    error.error_type,
                    error.reason
                );
            }
        }
        Some(message)
    }

    /// Parse an OpenSearch/Elasticsearch `_bulk` response body
    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        let raw: RawBulkResponse = serde_json::from_str(body)
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        let items = raw
            .items
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                // Each entry is keyed by its operation: {"index": {...}}
                let (_, item) = entry.into_iter().next().ok_or_else(|| {
                    TransportError::MalformedResponse(format!("item {} has no operation", i))
                })?;
                Ok(item.into())
            })
            .collect::<Result<Vec<BulkItem>, TransportError>>()?;

        Ok(Self {
            took: raw.took,
            items,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    took: u64,
    items: Vec<HashMap<String, RawBulkItem>>,
}

#[derive(Debug, Deserialize)]
struct RawBulkItem {
    #[serde(rename = "_index", default)]
    index: String,
    #[serde(rename = "_id", default)]
    id: Option<String>,
    status: u16,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl From<RawBulkItem> for BulkItem {
    fn from(raw: RawBulkItem) -> Self {
        let error = raw.error.map(|value| match value {
            serde_json::Value::String(reason) => ItemError {
                error_type: "unknown".to_string(),
                reason,
            },
            other => ItemError {
                error_type: other
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                reason: other
                    .get("reason")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| other.to_string()),
            },
        });

        Self {
            index: raw.index,
            id: raw.id,
            status: raw.status,
            result: raw.result,
            error,
        }
    }
}
