pub mod job;

use thiserror::Error;

use crate::core::client::queue::QueueError;
use crate::core::client::storage::StorageError;

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Process-level errors. Any of them stops the worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The InstructLab config file could not be used
    #[error("InstructLab config error: {0}")]
    IlabConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Worker Error: {0}")]
    WorkerAnyHowError(#[from] anyhow::Error),
}
