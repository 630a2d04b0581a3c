//! Process execution for admitted jobs.
//!
//! [`LocalExecutor`] spawns the command via `tokio::process` and hands
//! back a [`ProcessHandle`]: live output lines, a one-shot exit report,
//! and a stop token that kills the child. The scheduler's dispatch loop
//! consumes the handle; it never touches the process directly.

pub mod executor;

pub use executor::{LocalExecutor, OutputLine, ProcessExecutor, ProcessHandle};
