use crate::core::client::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Could not read output directory {path}: {source}")]
    ReadDir { path: String, source: std::io::Error },

    #[error("No publishable artifacts found in {0}")]
    NothingToPublish(String),

    #[error("Could not write index page {path}: {source}")]
    WriteIndex { path: String, source: std::io::Error },

    #[error("Could not upload index page: {0}")]
    UploadIndex(#[source] StorageError),
}
