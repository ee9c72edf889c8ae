use clap::Args;
use std::path::PathBuf;
use url::Url;

/// Parameters for the remote SDG service and its mutual TLS setup.
#[derive(Debug, Clone, Args)]
pub struct SdgCliArgs {
    /// Endpoint of the SDG service. Knowledge requests replace `skill` with `knowledge` in it.
    #[arg(env = "ILWORKER_SDG_ENDPOINT_URL", long, default_value = "http://localhost:8000/v1")]
    pub sdg_endpoint_url: Url,

    /// Path to the TLS client certificate
    #[arg(env = "ILWORKER_TLS_CLIENT_CERT", long, default_value = "client-tls-crt.pem2")]
    pub tls_client_cert: PathBuf,

    /// Path to the TLS client key
    #[arg(env = "ILWORKER_TLS_CLIENT_KEY", long, default_value = "client-tls-key.pem2")]
    pub tls_client_key: PathBuf,

    /// Path to the TLS server CA certificate
    #[arg(env = "ILWORKER_TLS_SERVER_CA_CERT", long, default_value = "server-ca-crt.pem2")]
    pub tls_server_ca_cert: PathBuf,

    /// Skip verification of the server certificate (SDG, model listing and chat)
    #[arg(env = "ILWORKER_TLS_INSECURE", long, default_value_t = false)]
    pub tls_insecure: bool,

    /// Maximum number of seed examples sent to SDG per taxonomy file
    #[arg(env = "ILWORKER_MAX_SEED", long, short = 'm', default_value_t = 40)]
    pub max_seed: usize,
}
