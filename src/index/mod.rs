//! Page indexing backends and their coordination.

mod coordinator;
mod frontmatter;
mod fulltext;
mod operator;

pub(crate) use coordinator::apply_job_name;

pub use coordinator::{DrainOutcome, IndexCoordinator, IndexOperation, INDEX_QUEUE};
pub use frontmatter::FrontmatterIndex;
pub use fulltext::FulltextIndex;
pub use operator::{IndexError, IndexOperator};
