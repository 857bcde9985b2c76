//! Batch import of article files into a search index
//!
//! # Example Usage
//!
//! ```no_run
//! use artindex::bulk::HttpTransport;
//! use artindex::config::OpenSearchConfig;
//! use artindex::import::{discover_files, IndexCoordinatorBuilder, JsonLinesSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(&OpenSearchConfig::default())?;
//!
//! let mut coordinator = IndexCoordinatorBuilder::new()
//!     .with_transport(transport)
//!     .with_index_name("articles")
//!     .with_batch_size(100)
//!     .build()?;
//!
//! let files = discover_files("data", "json");
//! let result = coordinator.run(&files, &JsonLinesSource::new())?;
//! println!("Indexed {} of {} articles", result.records_indexed, result.records_attempted);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Index Coordinator                           │
//! │           (one file, then one batch at a time; progress)            │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │                  │                  │                 │
//!          ▼                  ▼                  ▼                 ▼
//! ┌────────────────┐ ┌────────────────┐ ┌────────────────┐ ┌────────────────┐
//! │  RecordSource  │ │   partition    │ │  bulk::build   │ │ BulkTransport  │
//! │ (JSON lines)   │ │ (fixed size)   │ │ (NDJSON body)  │ │ + classify     │
//! └────────────────┘ └────────────────┘ └────────────────┘ └────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │        RunResult + FailureLog (rejected ids, failed batches)        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod batch;
pub mod coordinator;
pub mod outcome;
pub mod progress;
pub mod source;

pub use audit::{FailureEntry, FailureLog};
pub use batch::{partition, Batch};
pub use coordinator::{IndexCoordinator, IndexCoordinatorBuilder, FAILED_ARTICLES_TARGET};
pub use outcome::{BatchOutcome, BatchStatus, FailureStage, FileFailure, RunResult};
pub use progress::{BatchProgress, ConsoleProgress, NoProgress, ProgressObserver, ProgressState};
pub use source::{discover_files, JsonLinesSource, RecordSource};
