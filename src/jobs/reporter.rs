//! Error reporting for queued work.
//!
//! Failures inside workers and index backends are contained rather than
//! propagated, so they surface through an injected reporter instead of a
//! return value.

use super::dispatcher::DispatchError;
use super::job::JobError;
use crate::index::IndexError;
use std::sync::Mutex;
use tracing::error;

/// Sink for errors that have no caller left to return to.
pub trait JobErrorReporter: Send + Sync {
    /// A job finished with an error or panicked.
    fn job_failed(&self, queue: &str, job: &str, error: &JobError);

    /// An enqueue was refused by the dispatcher.
    fn enqueue_rejected(&self, job: &str, error: &DispatchError);

    /// One index backend rejected an apply. The remaining backends still ran.
    fn index_backend_failed(&self, backend: &str, page_id: &str, error: &IndexError);
}

/// Default reporter: structured log lines via tracing.
pub struct TracingErrorReporter;

impl JobErrorReporter for TracingErrorReporter {
    fn job_failed(&self, queue: &str, job: &str, error: &JobError) {
        error!("Job {} on queue {} failed: {}", job, queue, error);
    }

    fn enqueue_rejected(&self, job: &str, error: &DispatchError) {
        error!("Failed to enqueue {}: {}", job, error);
    }

    fn index_backend_failed(&self, backend: &str, page_id: &str, error: &IndexError) {
        error!(
            "Index backend {} failed for page {}: {}",
            backend, page_id, error
        );
    }
}

/// A reported error captured by [`RecordingErrorReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedError {
    JobFailed {
        queue: String,
        job: String,
        message: String,
    },
    EnqueueRejected {
        job: String,
        message: String,
    },
    IndexBackendFailed {
        backend: String,
        page_id: String,
        message: String,
    },
}

/// Reporter that captures events in memory so tests can assert on them.
#[derive(Default)]
pub struct RecordingErrorReporter {
    events: Mutex<Vec<RecordedError>>,
}

impl RecordingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedError> {
        self.events.lock().unwrap().clone()
    }
}

impl JobErrorReporter for RecordingErrorReporter {
    fn job_failed(&self, queue: &str, job: &str, error: &JobError) {
        self.events.lock().unwrap().push(RecordedError::JobFailed {
            queue: queue.to_string(),
            job: job.to_string(),
            message: error.to_string(),
        });
    }

    fn enqueue_rejected(&self, job: &str, error: &DispatchError) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedError::EnqueueRejected {
                job: job.to_string(),
                message: error.to_string(),
            });
    }

    fn index_backend_failed(&self, backend: &str, page_id: &str, error: &IndexError) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedError::IndexBackendFailed {
                backend: backend.to_string(),
                page_id: page_id.to_string(),
                message: error.to_string(),
            });
    }
}
