//! `rollcall-recon` - attendance submission reconciliation engine.
//!
//! Pure engine crate: reads tables through the [`TableStore`] seam, joins
//! intake submissions against the activity catalog and member roster, and
//! posts the resulting records to the ledger. No CLI or file IO.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod reference;
pub mod store;
pub mod submission;

pub use config::PostingConfig;
pub use engine::{post_pending, PostOptions};
pub use error::{ConfigError, PostingError, StoreError};
pub use model::{AttendanceRecord, BatchReport, BatchSummary, Diagnostic};
pub use store::{MemoryStore, TableId, TableStore};
