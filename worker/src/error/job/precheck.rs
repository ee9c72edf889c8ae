use crate::core::client::command::CommandError;
use crate::error::job::taxonomy::TaxonomyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrecheckError {
    #[error("No modified YAML files detected in the PR for precheck")]
    NoModifiedFiles,

    #[error("Could not read taxonomy file {path}: {source}")]
    ReadFile { path: String, source: std::io::Error },

    #[error("{path}: {source}")]
    Taxonomy { path: String, source: TaxonomyError },

    #[error("Could not prepare chatlog directory {path}: {source}")]
    ChatlogDir { path: String, source: std::io::Error },

    #[error("Precheck command error: {0}")]
    Command(#[from] CommandError),

    #[error("Precheck cancelled")]
    Cancelled,
}
