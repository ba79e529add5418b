use crate::page_store::StoreError;
use thiserror::Error;

/// Errors from index backends.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("page store: {0}")]
    Store(#[from] StoreError),

    #[error("index database: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One index backend, keyed by page identifier.
///
/// Backends read page content themselves at apply time, so a queued add
/// observes the newest write rather than a snapshot taken at enqueue.
pub trait IndexOperator: Send + Sync {
    /// Backend name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Add or refresh a page in this index.
    fn add_page(&self, page_id: &str) -> Result<(), IndexError>;

    /// Remove a page from this index.
    fn remove_page(&self, page_id: &str) -> Result<(), IndexError>;
}
