use crate::page_store::StoreError;
use thiserror::Error;

/// Errors produced by job execution.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("page store: {0}")]
    Store(#[from] StoreError),

    #[error("no page found for legacy identifier {0:?}")]
    MissingLegacyPage(String),

    #[error("{0}")]
    Failed(String),
}

/// A unit of queued work.
///
/// Jobs run on blocking worker threads, so `execute` is free to do
/// synchronous I/O and must not assume an async runtime.
pub trait Job: Send {
    /// Short name used in logs and error reports.
    fn name(&self) -> &str;

    /// Run the job to completion.
    fn execute(&self) -> Result<(), JobError>;
}

/// A job built from a closure.
pub struct FnJob<F> {
    name: String,
    f: F,
}

impl<F> FnJob<F>
where
    F: Fn() -> Result<(), JobError> + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Job for FnJob<F>
where
    F: Fn() -> Result<(), JobError> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<(), JobError> {
        (self.f)()
    }
}
