//! Named job queues and their workers.

mod coordinator;
mod dispatcher;
mod job;
mod reporter;

pub use coordinator::{JobQueueCoordinator, QueueStats};
pub use dispatcher::{DispatchError, FailingDispatcher, TokioDispatcher, WorkerDispatcher};
pub use job::{FnJob, Job, JobError};
pub use reporter::{
    JobErrorReporter, RecordedError, RecordingErrorReporter, TracingErrorReporter,
};
