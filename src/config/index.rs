//! Indexing run configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default destination index
pub const DEFAULT_INDEX_NAME: &str = "articles";

/// Default number of articles per bulk request
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Characters OpenSearch refuses in index names
const FORBIDDEN_INDEX_CHARS: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

/// Maximum index name length in bytes
const MAX_INDEX_NAME_BYTES: usize = 255;

/// Indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Destination index
    pub index_name: String,
    /// Articles per bulk request
    pub batch_size: usize,
    /// Directory searched for input files
    pub data_dir: PathBuf,
    /// Extension of input files
    pub file_extension: String,
    /// Use article ids as document ids instead of backend-assigned ids
    pub use_record_ids: bool,
    /// JSON-lines audit file for rejected articles (None = log only)
    pub failure_log: Option<PathBuf>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            index_name: DEFAULT_INDEX_NAME.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            data_dir: PathBuf::from("data"),
            file_extension: "json".to_string(),
            use_record_ids: false,
            failure_log: Some(PathBuf::from("failed-indexed-articles.log")),
        }
    }
}

/// Check an index name against OpenSearch naming rules
pub fn validate_index_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("index name must not be empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("index name must not be '{}'", name));
    }
    if name.len() > MAX_INDEX_NAME_BYTES {
        return Err(format!("index name must be at most {} bytes", MAX_INDEX_NAME_BYTES));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(format!("index name '{}' must not start with '-', '_' or '+'", name));
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(format!("index name '{}' must be lowercase", name));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
        return Err(format!("index name '{}' must not contain '{}'", name, c));
    }
    Ok(())
}
