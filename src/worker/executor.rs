use std::io;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::scheduler::job::CommandSpec;

const OUTPUT_CHANNEL_CAPACITY: usize = 64;

/// One line of process output, tagged with the stream it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// A started process as the scheduler sees it: a stream of output
/// lines, a one-shot exit report, and a stop capability.
///
/// Cancelling `stop` kills the underlying process; `done` fires once
/// the process is gone, whichever way it went. The exit code is `None`
/// when the process was killed by a signal.
#[derive(Debug)]
pub struct ProcessHandle {
    pub output: mpsc::Receiver<OutputLine>,
    pub done: oneshot::Receiver<Option<i32>>,
    pub stop: CancellationToken,
}

/// Capability to start a command. The production implementation spawns
/// real processes; tests substitute a scripted one.
pub trait ProcessExecutor: Send + Sync {
    fn start(&self, spec: &CommandSpec) -> io::Result<ProcessHandle>;
}

/// Runs commands as child processes on this host.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessExecutor for LocalExecutor {
    fn start(&self, spec: &CommandSpec) -> io::Result<ProcessHandle> {
        let mut child = Command::new(&spec.command)
            .args(&spec.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let (line_tx, line_rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        let (done_tx, done_rx) = oneshot::channel();
        let stop = CancellationToken::new();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_lines(stdout, line_tx.clone(), OutputLine::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_lines(stderr, line_tx, OutputLine::Stderr));
        }

        let watcher_stop = stop.clone();
        tokio::spawn(async move {
            let natural_exit = tokio::select! {
                _ = watcher_stop.cancelled() => None,
                status = child.wait() => Some(status),
            };

            let code = match natural_exit {
                Some(status) => status.ok().and_then(|s| s.code()),
                None => {
                    if let Err(e) = child.start_kill() {
                        tracing::warn!(error = %e, "Failed to kill process");
                    }
                    child.wait().await.ok().and_then(|s| s.code())
                }
            };

            let _ = done_tx.send(code);
        });

        Ok(ProcessHandle {
            output: line_rx,
            done: done_rx,
            stop,
        })
    }
}

/// Forward lines from one output stream until it closes. Read errors
/// end the forwarding only; whether the job ends is decided by the exit
/// watcher.
async fn pump_lines<R>(stream: R, tx: mpsc::Sender<OutputLine>, wrap: fn(String) -> OutputLine)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(wrap(line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Error reading process output");
                break;
            }
        }
    }
}
