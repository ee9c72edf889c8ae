use crate::error::job::taxonomy::TaxonomyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdgError {
    #[error("failed to load TLS material {path}: {reason}")]
    Tls { path: String, reason: String },

    #[error("failed to build the SDG http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("failed to read taxonomy file '{path}': {source}")]
    ReadFile { path: String, source: std::io::Error },

    #[error("{path}: {source}")]
    Taxonomy { path: String, source: TaxonomyError },

    #[error("failed to build the SDG request body: {0}")]
    Payload(String),

    #[error("failed to execute request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to read response body: {0}")]
    ResponseBody(#[source] reqwest::Error),

    #[error("unexpected status code {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("failed to write output file {path}: {source}")]
    WriteOutput { path: String, source: std::io::Error },

    #[error("SDG request cancelled")]
    Cancelled,
}
