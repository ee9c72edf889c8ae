pub mod git;
pub mod model;
pub mod precheck;
pub mod publish;
pub mod sdg;
pub mod taxonomy;

use crate::core::client::command::CommandError;
use crate::core::client::queue::QueueError;
use crate::types::jobs::types::JobField;
use git::GitError;
use precheck::PrecheckError;
use publish::PublishError;
use sdg::SdgError;
use thiserror::Error;

pub type JobResult<T> = Result<T, JobError>;

/// Everything that routes a job to the error path. The `Display` output is what
/// ends up in the job's `errors` field.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    #[error("Command error: {0}")]
    CommandError(#[from] CommandError),

    #[error("git operations error: {0}")]
    GitError(#[from] GitError),

    #[error("{0}")]
    PrecheckError(#[from] PrecheckError),

    #[error("{0}")]
    SdgError(#[from] SdgError),

    #[error("{0}")]
    PublishError(#[from] PublishError),

    #[error("Field {field} is not set for job {token}")]
    MissingField { token: String, field: JobField },

    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    #[error("Invalid pull request number {0:?}")]
    InvalidPrNumber(String),

    /// A pipeline command exited with a non-zero status
    #[error("Error running command ({command}): exit status {status}\nstdout: {stdout}\nstderr: {stderr}")]
    CommandFailed { command: String, status: String, stdout: String, stderr: String },

    #[error("Failed to prepare {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Job was cancelled")]
    Cancelled,
}

impl JobError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        JobError::Io { path: path.display().to_string(), source }
    }
}
