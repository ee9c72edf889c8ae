use crate::types::constant::LOCAL_ENDPOINT;
use clap::Args;

/// Parameters for the precheck pipeline.
#[derive(Debug, Clone, Args)]
pub struct PrecheckCliArgs {
    /// Endpoint hosting the model API. By default the model is assumed to be served locally.
    #[arg(env = "ILWORKER_PRECHECK_ENDPOINT_URL", long, short = 'e', default_value = LOCAL_ENDPOINT)]
    pub precheck_endpoint_url: String,

    /// The API key for the precheck endpoint
    #[arg(env = "ILWORKER_PRECHECK_API_KEY", long, hide_env_values = true)]
    pub precheck_api_key: Option<String>,
}
