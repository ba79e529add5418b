use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio::runtime::Handle;

/// Synchronous failure to hand a queue worker to the runtime.
#[derive(Debug, Clone, Error)]
#[error("queue {queue:?}: {reason}")]
pub struct DispatchError {
    pub queue: String,
    pub reason: String,
}

impl DispatchError {
    pub fn new(queue: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            reason: reason.into(),
        }
    }
}

/// Boxed worker future handed to a dispatcher.
pub type WorkerTask = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Seam between the queue coordinator and task spawning.
///
/// The coordinator asks its dispatcher for a worker whenever a queue with no
/// live worker receives a job. A dispatcher may refuse, in which case the
/// enqueue fails and the job is discarded.
pub trait WorkerDispatcher: Send + Sync {
    fn dispatch(&self, queue: &str, worker: WorkerTask) -> Result<(), DispatchError>;
}

/// Dispatcher backed by the tokio runtime.
pub struct TokioDispatcher {
    handle: Handle,
}

impl TokioDispatcher {
    /// Capture the current runtime handle.
    ///
    /// Must be called from within a runtime. Enqueues can then arrive from
    /// any thread, including blocking job threads.
    pub fn new() -> Self {
        Self {
            handle: Handle::current(),
        }
    }
}

impl WorkerDispatcher for TokioDispatcher {
    fn dispatch(&self, _queue: &str, worker: WorkerTask) -> Result<(), DispatchError> {
        self.handle.spawn(worker);
        Ok(())
    }
}

/// Dispatcher that refuses every worker, for exercising exhaustion paths.
pub struct FailingDispatcher {
    reason: String,
}

impl FailingDispatcher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl WorkerDispatcher for FailingDispatcher {
    fn dispatch(&self, queue: &str, _worker: WorkerTask) -> Result<(), DispatchError> {
        Err(DispatchError::new(queue, self.reason.clone()))
    }
}
