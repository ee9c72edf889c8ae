use crate::core::client::command::CommandError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("invalid git remote: {0}")]
    InvalidRemote(String),

    #[error("git {step} failed with exit status {status}: {stderr}")]
    StepFailed { step: &'static str, status: String, stderr: String },

    #[error("git rev-parse returned an empty commit hash")]
    EmptyHead,

    #[error("could not remove checkout {path}: {source}")]
    Cleanup { path: String, source: std::io::Error },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("checkout failed after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: Box<GitError> },
}

impl GitError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            GitError::Command(e) => e.is_cancelled(),
            GitError::RetriesExhausted { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}
