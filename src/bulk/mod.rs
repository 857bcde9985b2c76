//! Bulk write requests, their transport, and response classification
//!
//! ```text
//! Batch ──build──▶ BulkRequest ──submit──▶ BulkResponse ──classify──▶ FailureReport
//! ```
//!
//! Response items are matched to records by position, so the request keeps
//! batch order end to end.

pub mod classify;
pub mod request;
pub mod response;
pub mod transport;

pub use classify::{classify, FailureReport};
pub use request::{build, BulkAction, BulkRequest, BulkRequestBuilder, DocumentEncoder, JsonEncoder};
pub use response::{BulkItem, BulkResponse, ItemError};
pub use transport::{BulkTransport, HttpTransport};
