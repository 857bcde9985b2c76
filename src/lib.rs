//! artindex: batch loader for article records into an OpenSearch index
//!
//! Reads newline-delimited JSON article files, groups the records into
//! fixed-size batches and sends each batch as one `_bulk` request:
//! - Ordered, lossless batching
//! - All-or-nothing request building per batch
//! - Positional attribution of rejected documents
//! - Per-batch outcomes and an audit log of everything not indexed

pub mod bulk;
pub mod config;
pub mod error;
pub mod import;
pub mod types;

pub use config::Config;
pub use error::{IndexerError, ParseError, SerializationError, TransportError};
pub use types::*;
