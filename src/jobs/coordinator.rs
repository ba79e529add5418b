//! Named job queues with per-queue serial execution.
//!
//! Each queue runs its jobs strictly in FIFO order on a single worker task;
//! different queues make progress independently. Workers are spawned lazily
//! when an idle queue receives a job and retire as soon as their queue
//! drains, so an idle system holds no tasks.

use super::dispatcher::{DispatchError, WorkerDispatcher};
use super::job::{Job, JobError};
use super::reporter::JobErrorReporter;
use crate::metrics;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error};

/// Point-in-time view of one queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub name: String,
    /// Jobs enqueued but not yet finished, including the one executing.
    pub jobs_remaining: usize,
    /// Largest value `jobs_remaining` reached since the worker last started.
    pub high_water_mark: usize,
    pub is_active: bool,
}

struct QueueState {
    pending: VecDeque<Box<dyn Job>>,
    jobs_remaining: usize,
    high_water_mark: usize,
    worker_active: bool,
}

impl QueueState {
    fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            jobs_remaining: 0,
            high_water_mark: 0,
            worker_active: false,
        }
    }

    fn stats(&self, name: &str) -> QueueStats {
        QueueStats {
            name: name.to_string(),
            jobs_remaining: self.jobs_remaining,
            high_water_mark: self.high_water_mark,
            is_active: self.worker_active,
        }
    }

    fn deactivate(&mut self) {
        self.worker_active = false;
        self.jobs_remaining = 0;
        self.high_water_mark = 0;
    }
}

struct Shared {
    queues: Mutex<HashMap<String, QueueState>>,
    reporter: Arc<dyn JobErrorReporter>,
}

/// Routes jobs onto named FIFO queues and keeps one worker per active queue.
pub struct JobQueueCoordinator {
    shared: Arc<Shared>,
    dispatcher: Arc<dyn WorkerDispatcher>,
}

impl JobQueueCoordinator {
    pub fn new(dispatcher: Arc<dyn WorkerDispatcher>, reporter: Arc<dyn JobErrorReporter>) -> Self {
        Self {
            shared: Arc::new(Shared {
                queues: Mutex::new(HashMap::new()),
                reporter,
            }),
            dispatcher,
        }
    }

    /// Append a job to the named queue, creating the queue on first use.
    ///
    /// The only synchronous failure is the dispatcher refusing a worker; the
    /// job is discarded in that case. A queue whose very first enqueue fails
    /// this way is not recorded at all.
    pub fn enqueue(&self, queue: &str, job: Box<dyn Job>) -> Result<(), DispatchError> {
        let mut queues = self.shared.queues.lock().unwrap();

        let needs_worker = match queues.get(queue) {
            Some(state) => !state.worker_active,
            None => true,
        };

        if needs_worker {
            let worker = Box::pin(run_worker(Arc::clone(&self.shared), queue.to_string()));
            self.dispatcher.dispatch(queue, worker)?;
        }

        let state = queues
            .entry(queue.to_string())
            .or_insert_with(QueueState::new);
        state.pending.push_back(job);
        state.jobs_remaining += 1;
        if state.jobs_remaining > state.high_water_mark {
            state.high_water_mark = state.jobs_remaining;
        }
        state.worker_active = true;

        metrics::set_active_queues(queues.values().filter(|q| q.worker_active).count());
        Ok(())
    }

    /// Stats for one queue, `None` if nothing was ever enqueued under `name`.
    pub fn queue_stats(&self, name: &str) -> Option<QueueStats> {
        let queues = self.shared.queues.lock().unwrap();
        queues.get(name).map(|state| state.stats(name))
    }

    /// Stats for every queue that currently has a live worker, sorted by name.
    pub fn active_queues(&self) -> Vec<QueueStats> {
        let queues = self.shared.queues.lock().unwrap();
        let mut active: Vec<QueueStats> = queues
            .iter()
            .filter(|(_, state)| state.worker_active)
            .map(|(name, state)| state.stats(name))
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }

    /// Stats for every queue seen so far, drained ones included, sorted by
    /// name. Drained queues report zeroed numbers.
    pub fn all_queues(&self) -> Vec<QueueStats> {
        let queues = self.shared.queues.lock().unwrap();
        let mut all: Vec<QueueStats> = queues
            .iter()
            .map(|(name, state)| state.stats(name))
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }
}

/// One queue's worker: pop, execute, repeat until the queue drains.
async fn run_worker(shared: Arc<Shared>, queue: String) {
    debug!("Worker started for queue {}", queue);
    loop {
        let job = {
            let mut queues = shared.queues.lock().unwrap();
            let Some(state) = queues.get_mut(&queue) else {
                error!("State for queue {} is missing, retiring worker", queue);
                break;
            };
            match state.pending.pop_front() {
                Some(job) => job,
                None => {
                    state.deactivate();
                    metrics::set_active_queues(
                        queues.values().filter(|q| q.worker_active).count(),
                    );
                    break;
                }
            }
        };

        let job_name = job.name().to_string();
        let started = Instant::now();
        let result = tokio::task::spawn_blocking(move || job.execute()).await;
        let elapsed = started.elapsed();

        let status = match result {
            Ok(Ok(())) => {
                debug!(
                    "Job {} on queue {} completed in {:?}",
                    job_name, queue, elapsed
                );
                "success"
            }
            Ok(Err(e)) => {
                shared.reporter.job_failed(&queue, &job_name, &e);
                "failed"
            }
            Err(e) => {
                shared.reporter.job_failed(
                    &queue,
                    &job_name,
                    &JobError::Failed(format!("Task panic: {e}")),
                );
                "panic"
            }
        };
        metrics::record_job_execution(&queue, status, elapsed);

        // The job counts as remaining until this point.
        {
            let mut queues = shared.queues.lock().unwrap();
            if let Some(state) = queues.get_mut(&queue) {
                state.jobs_remaining = state.jobs_remaining.saturating_sub(1);
            }
        }
    }
    debug!("Worker retired for queue {}", queue);
}
