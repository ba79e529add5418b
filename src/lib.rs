//! Fernwiki Maintenance Library
//!
//! Background upkeep for a fernwiki page store: named job queues, index
//! consistency, and legacy identifier consolidation.

pub mod config;
pub mod consolidation;
pub mod ident;
pub mod index;
pub mod jobs;
pub mod metrics;
pub mod page_store;
pub mod page_writer;

// Re-export commonly used types for convenience
pub use consolidation::{ConflictResolver, ConflictWinner, LongerTextWins, MigrateJob, ScanJob};
pub use index::{
    DrainOutcome, FrontmatterIndex, FulltextIndex, IndexCoordinator, IndexError, IndexOperation,
    IndexOperator, INDEX_QUEUE,
};
pub use jobs::{
    DispatchError, Job, JobError, JobErrorReporter, JobQueueCoordinator, QueueStats,
    TokioDispatcher, TracingErrorReporter, WorkerDispatcher,
};
pub use page_store::{FsPageStore, MemoryPageStore, PageEntry, PageStore, StoreError};
pub use page_writer::PageWriter;
