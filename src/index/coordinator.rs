//! Index consistency coordination.
//!
//! Page writes and deletes must eventually reach every index backend. The
//! coordinator turns page events into jobs on a dedicated queue so callers
//! never wait on index maintenance, and tracks outstanding work so a
//! shutdown can wait for the indexes to settle.

use super::operator::IndexOperator;
use crate::jobs::{DispatchError, Job, JobError, JobErrorReporter, JobQueueCoordinator};
use crate::metrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Queue that carries all index maintenance jobs.
pub const INDEX_QUEUE: &str = "page_indexing";

/// Which index mutation to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOperation {
    Add,
    Remove,
}

impl IndexOperation {
    fn verb(self) -> &'static str {
        match self {
            IndexOperation::Add => "add",
            IndexOperation::Remove => "remove",
        }
    }
}

pub(crate) fn apply_job_name(op: IndexOperation, page_id: &str) -> String {
    format!("index {} {}", op.verb(), page_id)
}

/// Outcome of waiting for the index queue to drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed,
    TimedOut,
    Cancelled,
}

impl DrainOutcome {
    pub fn completed(self) -> bool {
        matches!(self, DrainOutcome::Completed)
    }

    pub fn timed_out(self) -> bool {
        matches!(self, DrainOutcome::TimedOut)
    }
}

/// Count of index jobs created but not yet finished.
struct OutstandingCounter {
    count: watch::Sender<usize>,
}

impl OutstandingCounter {
    fn new() -> Self {
        Self {
            count: watch::channel(0).0,
        }
    }

    fn begin(counter: &Arc<Self>) -> OutstandingGuard {
        counter.count.send_modify(|n| *n += 1);
        OutstandingGuard {
            counter: Arc::clone(counter),
        }
    }

    fn current(&self) -> usize {
        *self.count.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}

/// One unit of outstanding index work. Settled on drop, so a job that
/// panics or is never dispatched still counts down.
struct OutstandingGuard {
    counter: Arc<OutstandingCounter>,
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.counter.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Countdown for a bulk enqueue with a completion callback.
struct BulkBatch {
    remaining: AtomicUsize,
    on_complete: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl BulkBatch {
    fn new(size: usize, on_complete: Box<dyn FnOnce() + Send>) -> Arc<Self> {
        let batch = Arc::new(Self {
            remaining: AtomicUsize::new(size),
            on_complete: Mutex::new(Some(on_complete)),
        });
        if size == 0 {
            batch.fire();
        }
        batch
    }

    fn settle_one(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.fire();
        }
    }

    /// Runs the callback at most once.
    fn fire(&self) {
        let callback = self.on_complete.lock().unwrap().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// One queued apply against every backend.
struct IndexApplyJob {
    name: String,
    page_id: String,
    op: IndexOperation,
    backends: Arc<[Arc<dyn IndexOperator>]>,
    reporter: Arc<dyn JobErrorReporter>,
    _outstanding: OutstandingGuard,
    batch: Option<Arc<BulkBatch>>,
}

impl Drop for IndexApplyJob {
    fn drop(&mut self) {
        if let Some(batch) = &self.batch {
            batch.settle_one();
        }
    }
}

impl Job for IndexApplyJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<(), JobError> {
        for backend in self.backends.iter() {
            let result = match self.op {
                IndexOperation::Add => backend.add_page(&self.page_id),
                IndexOperation::Remove => backend.remove_page(&self.page_id),
            };
            // A failing backend never blocks the remaining ones; that one
            // index is simply stale for this page until a later apply.
            if let Err(err) = result {
                metrics::record_index_backend_error(backend.name());
                self.reporter
                    .index_backend_failed(backend.name(), &self.page_id, &err);
            }
        }
        Ok(())
    }
}

/// Keeps the index backends consistent with the page store.
pub struct IndexCoordinator {
    queue: Arc<JobQueueCoordinator>,
    backends: Arc<[Arc<dyn IndexOperator>]>,
    reporter: Arc<dyn JobErrorReporter>,
    outstanding: Arc<OutstandingCounter>,
}

impl IndexCoordinator {
    /// Backends are applied in the order given here.
    pub fn new(
        queue: Arc<JobQueueCoordinator>,
        backends: Vec<Arc<dyn IndexOperator>>,
        reporter: Arc<dyn JobErrorReporter>,
    ) -> Self {
        Self {
            queue,
            backends: backends.into(),
            reporter,
            outstanding: Arc::new(OutstandingCounter::new()),
        }
    }

    /// Queue an index apply for one page.
    pub fn enqueue(&self, page_id: &str, op: IndexOperation) -> Result<(), DispatchError> {
        let job = self.make_job(page_id, op, None);
        self.queue.enqueue(INDEX_QUEUE, Box::new(job))
    }

    /// Queue index applies for a batch of pages.
    ///
    /// A rejected enqueue does not stop the rest of the batch; every
    /// rejection is reported and the first one is returned.
    pub fn enqueue_bulk(&self, page_ids: &[String], op: IndexOperation) -> Result<(), DispatchError> {
        self.enqueue_bulk_inner(page_ids, op, None)
    }

    /// Queue index applies for a batch of pages and run `on_complete`
    /// exactly once after the last of them settles. An empty batch
    /// completes immediately.
    pub fn enqueue_bulk_with_completion(
        &self,
        page_ids: &[String],
        op: IndexOperation,
        on_complete: Box<dyn FnOnce() + Send>,
    ) -> Result<(), DispatchError> {
        let batch = BulkBatch::new(page_ids.len(), on_complete);
        self.enqueue_bulk_inner(page_ids, op, Some(batch))
    }

    fn enqueue_bulk_inner(
        &self,
        page_ids: &[String],
        op: IndexOperation,
        batch: Option<Arc<BulkBatch>>,
    ) -> Result<(), DispatchError> {
        let mut first_error = None;
        for page_id in page_ids {
            let job = self.make_job(page_id, op, batch.clone());
            let job_name = job.name.clone();
            if let Err(err) = self.queue.enqueue(INDEX_QUEUE, Box::new(job)) {
                self.reporter.enqueue_rejected(&job_name, &err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn make_job(
        &self,
        page_id: &str,
        op: IndexOperation,
        batch: Option<Arc<BulkBatch>>,
    ) -> IndexApplyJob {
        IndexApplyJob {
            name: apply_job_name(op, page_id),
            page_id: page_id.to_string(),
            op,
            backends: Arc::clone(&self.backends),
            reporter: Arc::clone(&self.reporter),
            _outstanding: OutstandingCounter::begin(&self.outstanding),
            batch,
        }
    }

    /// Index jobs created but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.outstanding.current()
    }

    /// Wait until every index job created so far has settled, the timeout
    /// elapses, or `cancel` fires. A token that is already cancelled wins
    /// even when no work is outstanding; an already drained queue completes
    /// even with no timeout left.
    pub async fn wait_for_drain(
        &self,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> DrainOutcome {
        if cancel.is_cancelled() {
            return DrainOutcome::Cancelled;
        }
        if self.outstanding.current() == 0 {
            return DrainOutcome::Completed;
        }

        let mut outstanding = self.outstanding.subscribe();
        tokio::select! {
            result = outstanding.wait_for(|count| *count == 0) => {
                // The sender lives in self, so the channel cannot close
                // while the coordinator exists
                debug!("Index queue drained: {:?}", result.map(|count| *count));
                DrainOutcome::Completed
            }
            _ = tokio::time::sleep(timeout) => DrainOutcome::TimedOut,
            _ = cancel.cancelled() => DrainOutcome::Cancelled,
        }
    }
}
