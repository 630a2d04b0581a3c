//! Admission, queueing, dispatch, and cancellation of jobs.
//!
//! The [`Scheduler`] is the single entry point: `submit` decides
//! immediate run vs. enqueue under the concurrency limit, `cancel`
//! signals a running job's token or pulls a queued job out of line, and
//! `status`/`get` read consistent snapshots. All shared state lives in
//! one [`JobRegistry`] behind one mutex.

mod dispatcher;
pub mod job;
pub mod registry;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use job::{CommandSpec, Job, JobStatus};
pub use registry::{JobRegistry, StatusSnapshot};

use crate::worker::ProcessExecutor;

/// What a cancel request actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// A running job's token was triggered; the worker task performs
    /// the Cancelled transition once the process is stopped.
    Signalled,
    /// A queued job was removed before it ever ran.
    Dequeued,
    /// Unknown id or already-terminal job; nothing changed.
    Noop,
}

impl CancelOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelOutcome::Signalled => "signalled",
            CancelOutcome::Dequeued => "dequeued",
            CancelOutcome::Noop => "noop",
        }
    }
}

pub(crate) struct SchedulerInner {
    /// Maximum simultaneously running jobs; 0 means unlimited.
    pub(crate) limit: usize,
    pub(crate) executor: Arc<dyn ProcessExecutor>,
    pub(crate) registry: Mutex<JobRegistry>,
}

#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    pub fn new(limit: usize, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                limit,
                executor,
                registry: Mutex::new(JobRegistry::new()),
            }),
        }
    }

    /// Admit a job: run it immediately if a slot is free, otherwise
    /// append it to the queue. The id is issued synchronously either
    /// way and the call never waits on execution.
    pub async fn submit(&self, command: CommandSpec) -> Uuid {
        let job = Job::new(command);
        let id = job.id;
        let name = job.command.command.clone();

        let mut registry = self.inner.registry.lock().await;
        if self.inner.limit == 0 || registry.running_count() < self.inner.limit {
            let cancel = CancellationToken::new();
            let spec = job.command.clone();
            registry.admit_running(job, cancel.clone());
            drop(registry);

            tracing::info!(job_id = %id, command = %name, "Job admitted");
            dispatcher::spawn_worker(self.inner.clone(), id, spec, cancel);
        } else {
            registry.enqueue(job);
            tracing::info!(job_id = %id, command = %name, "Job queued, at capacity");
        }

        id
    }

    /// Cancel a job. Running jobs get their token triggered; queued
    /// jobs are removed and recorded as Cancelled. Anything else is a
    /// no-op, reported as such but never an error.
    pub async fn cancel(&self, id: Uuid) -> CancelOutcome {
        let mut registry = self.inner.registry.lock().await;

        if let Some(token) = registry.cancel_token(&id) {
            drop(registry);
            token.cancel();
            tracing::info!(job_id = %id, "Cancellation signalled");
            return CancelOutcome::Signalled;
        }

        if registry.cancel_queued(&id) {
            tracing::info!(job_id = %id, "Cancelled while queued");
            return CancelOutcome::Dequeued;
        }

        tracing::debug!(job_id = %id, "Cancel was a no-op");
        CancelOutcome::Noop
    }

    /// Consistent snapshot of every known job.
    pub async fn status(&self) -> StatusSnapshot {
        self.inner.registry.lock().await.snapshot()
    }

    /// Snapshot of a single job.
    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.inner.registry.lock().await.get(&id)
    }
}
