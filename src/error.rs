//! Error taxonomy for indexing runs
//!
//! Batch-level failures (`Serialization`, `Transport`) are caught by the
//! coordinator and recorded in the run result. `InvalidConfiguration` and
//! `ProtocolMismatch` are returned to the caller of the run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the indexing pipeline
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(
        "Bulk response for batch {batch} of {} has {actual} items but the request had {expected} actions",
        source_name(.file)
    )]
    ProtocolMismatch {
        /// File the batch was read from, `None` for in-memory records
        file: Option<PathBuf>,
        batch: usize,
        expected: usize,
        actual: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A record file could not be decoded
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at {path}:{line}: {source}")]
    Record {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// Path of the file that failed
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. } | Self::Record { path, .. } => path,
        }
    }
}

/// A record could not be turned into a write action
#[derive(Debug, Error)]
#[error("Failed to encode record '{record_id}': {reason}")]
pub struct SerializationError {
    pub record_id: String,
    pub reason: String,
}

/// The backend could not be reached or answered with something unusable
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed bulk response: {0}")]
    MalformedResponse(String),

    #[error("Transport configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.to_string())
    }
}

fn source_name(file: &Option<PathBuf>) -> String {
    file.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}

/// Result type for indexing operations
pub type Result<T> = std::result::Result<T, IndexerError>;
