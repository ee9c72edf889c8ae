use thiserror::Error;

/// Failures of the model listing query. They are logged and replaced by the default model name.
#[derive(Error, Debug)]
pub enum ModelListError {
    #[error("invalid precheck endpoint {0}")]
    InvalidEndpoint(String),

    #[error("failed to build the http client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("failed to fetch model details: {0}")]
    Request(#[source] reqwest::Error),

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("failed to parse JSON response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("expected object type 'list', got '{0}'")]
    NotAList(String),

    #[error("model name not found in response")]
    NotFound,

    #[error("model listing cancelled")]
    Cancelled,
}
