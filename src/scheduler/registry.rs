use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::scheduler::job::{CommandSpec, Job, JobStatus};

/// A job currently occupying an execution slot, together with the token
/// that cancels it. The token exists exactly as long as the job is in
/// the running set.
#[derive(Debug)]
struct RunningJob {
    job: Job,
    cancel: CancellationToken,
}

/// Consistent point-in-time view of every known job, each in exactly
/// one partition.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub queued: Vec<Job>,
    pub running: HashMap<Uuid, Job>,
    pub completed: Vec<Job>,
}

/// Authoritative store of job state: the FIFO queue of pending jobs,
/// the running set, and the completed history.
///
/// The registry itself is a plain container; the scheduler wraps it in
/// a single mutex and every mutation goes through that lock.
#[derive(Debug, Default)]
pub struct JobRegistry {
    queued: VecDeque<Job>,
    running: HashMap<Uuid, RunningJob>,
    completed: Vec<Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    /// Append a job at the tail of the queue.
    pub fn enqueue(&mut self, job: Job) {
        debug_assert_eq!(job.status, JobStatus::Queued);
        self.queued.push_back(job);
    }

    /// Move a job straight into the running set, stamping its start
    /// time. The caller launches the matching worker task.
    pub fn admit_running(&mut self, mut job: Job, cancel: CancellationToken) {
        job.status = JobStatus::Running;
        job.start_time = Some(Utc::now());
        self.running.insert(job.id, RunningJob { job, cancel });
    }

    /// Remove the queue head and mark it Running with a fresh token.
    /// Returns what the caller needs to launch the worker task.
    pub fn promote_next(&mut self) -> Option<(Uuid, CommandSpec, CancellationToken)> {
        let job = self.queued.pop_front()?;
        let id = job.id;
        let spec = job.command.clone();
        let cancel = CancellationToken::new();
        self.admit_running(job, cancel.clone());
        Some((id, spec, cancel))
    }

    /// The cancellation token of a running job, if any.
    pub fn cancel_token(&self, id: &Uuid) -> Option<CancellationToken> {
        self.running.get(id).map(|entry| entry.cancel.clone())
    }

    /// Move a running job to the completed history with its terminal
    /// status and end timestamp. The end timestamp is set here and
    /// nowhere else for running jobs.
    pub fn complete(&mut self, id: &Uuid, status: JobStatus, error: Option<String>) -> bool {
        debug_assert!(status.is_terminal());
        match self.running.remove(id) {
            Some(entry) => {
                let mut job = entry.job;
                job.status = status;
                job.end_time = Some(Utc::now());
                if error.is_some() {
                    job.error = error;
                }
                self.completed.push(job);
                true
            }
            None => false,
        }
    }

    /// Remove a still-queued job and record it as Cancelled. Its start
    /// time stays unset because it never ran.
    pub fn cancel_queued(&mut self, id: &Uuid) -> bool {
        let Some(pos) = self.queued.iter().position(|job| job.id == *id) else {
            return false;
        };
        // remove() on a found index cannot fail
        let mut job = self.queued.remove(pos).expect("position was just found");
        job.status = JobStatus::Cancelled;
        job.end_time = Some(Utc::now());
        self.completed.push(job);
        true
    }

    /// Snapshot of a single job, wherever it currently lives.
    pub fn get(&self, id: &Uuid) -> Option<Job> {
        if let Some(entry) = self.running.get(id) {
            return Some(entry.job.clone());
        }
        if let Some(job) = self.queued.iter().find(|job| job.id == *id) {
            return Some(job.clone());
        }
        self.completed.iter().find(|job| job.id == *id).cloned()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            queued: self.queued.iter().cloned().collect(),
            running: self
                .running
                .iter()
                .map(|(id, entry)| (*id, entry.job.clone()))
                .collect(),
            completed: self.completed.clone(),
        }
    }
}
