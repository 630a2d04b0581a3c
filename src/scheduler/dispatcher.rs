//! Per-job worker tasks.
//!
//! Every admitted job runs as one spawned task that drives the process
//! to a terminal state and then hands its freed slot to the next queued
//! job. Both the Done and the Cancelled paths funnel through the same
//! [`on_terminated`] hook, which is the only place a queued job gets
//! promoted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::scheduler::job::{CommandSpec, JobStatus};
use crate::scheduler::SchedulerInner;
use crate::worker::{OutputLine, ProcessHandle};

pub(crate) fn spawn_worker(
    inner: Arc<SchedulerInner>,
    id: Uuid,
    spec: CommandSpec,
    cancel: CancellationToken,
) {
    tokio::spawn(run_job(inner, id, spec, cancel));
}

async fn run_job(
    inner: Arc<SchedulerInner>,
    id: Uuid,
    spec: CommandSpec,
    cancel: CancellationToken,
) {
    let handle = match inner.executor.start(&spec) {
        Ok(handle) => handle,
        Err(e) => {
            // Recorded on the job, never fatal to the service.
            tracing::error!(job_id = %id, command = %spec.command, error = %e, "Failed to start process");
            on_terminated(&inner, id, JobStatus::Done, Some(e.to_string())).await;
            return;
        }
    };

    tracing::info!(job_id = %id, command = %spec.command, "Starting");

    let ProcessHandle {
        mut output,
        mut done,
        stop,
    } = handle;

    let status = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                // Stop the process and wait for the executor to confirm
                // it is gone before recording the Cancelled transition.
                stop.cancel();
                let _ = (&mut done).await;
                tracing::info!(job_id = %id, command = %spec.command, "Cancelled");
                break JobStatus::Cancelled;
            }
            line = output.recv() => match line {
                Some(OutputLine::Stdout(text)) => {
                    tracing::info!(job_id = %id, "{}", text);
                }
                Some(OutputLine::Stderr(text)) => {
                    tracing::warn!(job_id = %id, "{}", text);
                }
                None => {
                    // Output exhausted; the exit report follows.
                    let code = (&mut done).await.unwrap_or(None);
                    tracing::info!(job_id = %id, command = %spec.command, exit_code = ?code, "Finished");
                    break JobStatus::Done;
                }
            },
            exit = &mut done => {
                let code = exit.unwrap_or(None);
                tracing::info!(job_id = %id, command = %spec.command, exit_code = ?code, "Finished");
                break JobStatus::Done;
            }
        }
    };

    on_terminated(&inner, id, status, None).await;
}

/// Record a job's terminal state and, in the same critical section,
/// pull the next queued job into the freed slot. Running this for every
/// outcome keeps effective parallelism at the limit while the queue
/// drains eagerly.
async fn on_terminated(
    inner: &Arc<SchedulerInner>,
    id: Uuid,
    status: JobStatus,
    error: Option<String>,
) {
    let promoted = {
        let mut registry = inner.registry.lock().await;
        if !registry.complete(&id, status, error) {
            tracing::warn!(job_id = %id, "Terminated job was not in the running set");
        }
        registry.promote_next()
    };

    if let Some((next_id, spec, cancel)) = promoted {
        tracing::info!(job_id = %next_id, command = %spec.command, "Promoted from queue");
        spawn_worker(inner.clone(), next_id, spec, cancel);
    }
}
