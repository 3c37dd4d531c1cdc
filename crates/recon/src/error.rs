use crate::store::TableId;

/// Layout config could not be parsed or is internally inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config validation error (overlapping columns, empty table path, etc.).
    #[error("config validation error: {0}")]
    Validation(String),
}

/// A table store operation failed.
#[derive(Debug, thiserror::Error)]
#[error("{table} table: {message}")]
pub struct StoreError {
    pub table: TableId,
    pub message: String,
}

impl StoreError {
    pub fn new(table: TableId, message: impl Into<String>) -> Self {
        Self { table, message: message.into() }
    }
}

/// Run-level failure of a posting pass.
///
/// Per-row problems never surface here; they are reported as
/// [`Diagnostic`](crate::model::Diagnostic) values in the batch report.
#[derive(Debug, thiserror::Error)]
pub enum PostingError {
    /// Reading one of the input tables failed before anything was written.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The ledger append failed; no submission row was marked posted.
    #[error("ledger append failed, no rows marked posted: {0}")]
    LedgerAppend(#[source] StoreError),
    /// The ledger append succeeded but marking the source rows failed.
    #[error(
        "{appended} ledger record(s) were appended but marking {rows} submission row(s) posted failed: {source}"
    )]
    MarkPosted {
        appended: usize,
        rows: usize,
        #[source]
        source: StoreError,
    },
}
