use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Command not allowed: {0}")]
    CommandNotAllowed(String),

    #[error("Job not found: {0}")]
    JobNotFound(uuid::Uuid),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
