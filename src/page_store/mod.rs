//! Page storage backends.

mod fs_store;
mod memory;

pub use fs_store::FsPageStore;
pub use memory::MemoryPageStore;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Directory pages are moved into instead of being destroyed.
pub const QUARANTINE_DIR: &str = "__deleted__";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no page named {0:?}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One stored page, as seen by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub name: String,
    pub modified: DateTime<Utc>,
}

/// Storage for wiki pages, keyed by page identifier.
pub trait PageStore: Send + Sync {
    /// List every stored page, sorted by name.
    fn list(&self) -> Result<Vec<PageEntry>, StoreError>;

    /// Read a page's raw content.
    fn read(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    /// Create or overwrite a page.
    fn write(&self, name: &str, content: &[u8]) -> Result<(), StoreError>;

    /// Move a page into the quarantine area instead of destroying it.
    fn soft_delete(&self, name: &str) -> Result<(), StoreError>;
}
