use crate::error::job::model::ModelListError;
use crate::types::constant::{DEFAULT_MODEL_NAME, SDG_REPORTED_MODEL_NAME};
use crate::types::ilab_config::IlabConfig;
use crate::types::jobs::types::JobType;
use crate::types::params::PrecheckParams;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// The two views of the model a job runs against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    /// Passed to `ilab model chat --model`
    pub command_model: String,
    /// Written to the `model_name` job field
    pub reported_name: String,
}

#[derive(Deserialize)]
struct ModelList {
    object: String,
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    object: String,
}

/// Resolves the model names of a job, querying the precheck endpoint's model listing when it is remote.
pub struct ModelResolver<'a> {
    precheck: &'a PrecheckParams,
    ilab_config: &'a IlabConfig,
}

impl<'a> ModelResolver<'a> {
    pub fn new(precheck: &'a PrecheckParams, ilab_config: &'a IlabConfig) -> Self {
        Self { precheck, ilab_config }
    }

    pub async fn resolve(&self, job_type: JobType, cancel: &CancellationToken) -> ResolvedModel {
        if job_type == JobType::Sdg {
            return ResolvedModel {
                command_model: self.ilab_config.model_name(),
                reported_name: SDG_REPORTED_MODEL_NAME.to_string(),
            };
        }

        if !self.precheck.is_remote() {
            let name = self.ilab_config.model_name();
            return ResolvedModel { command_model: name.clone(), reported_name: name };
        }

        let model_id = match self.fetch_model_id(cancel).await {
            Ok(id) => {
                info!(model = %id, "Model served by the precheck endpoint");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch model name, using default model name {}", DEFAULT_MODEL_NAME);
                None
            }
        };

        let command_model = model_id.clone().unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
        let reported_name = match job_type {
            JobType::Precheck => match model_id {
                Some(id) => short_model_name(&id).to_string(),
                None => DEFAULT_MODEL_NAME.to_string(),
            },
            _ => self.ilab_config.model_name(),
        };
        ResolvedModel { command_model, reported_name }
    }

    /// `GET <endpoint>/models`, returning the id of the first entry of type `model`
    pub async fn fetch_model_id(&self, cancel: &CancellationToken) -> Result<String, ModelListError> {
        let address = format!("{}/models", self.precheck.endpoint_url.trim_end_matches('/'));
        let url = Url::parse(&address).map_err(|_| ModelListError::InvalidEndpoint(address.clone()))?;

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(self.precheck.tls_insecure)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ModelListError::ClientBuild)?;

        let mut request = client.get(url);
        if let Some(api_key) = &self.precheck.api_key {
            debug!("Setting Authorization header with the precheck API key");
            request = request.bearer_auth(api_key);
        }

        let response = tokio::select! {
            response = request.send() => response.map_err(ModelListError::Request)?,
            _ = cancel.cancelled() => return Err(ModelListError::Cancelled),
        };

        if !response.status().is_success() {
            return Err(ModelListError::UnexpectedStatus(response.status().as_u16()));
        }

        let listing: ModelList = response.json().await.map_err(ModelListError::Decode)?;
        if listing.object != "list" {
            return Err(ModelListError::NotAList(listing.object));
        }

        listing
            .data
            .into_iter()
            .find(|entry| entry.object == "model")
            .map(|entry| entry.id)
            .ok_or(ModelListError::NotFound)
    }
}

/// Short name of a served model: the part after the last `--` of the first path segment
/// containing one, or the whole id.
///
/// `models/ibm-granite--granite-7b-lab` gives `granite-7b-lab`.
pub fn short_model_name(model_id: &str) -> &str {
    model_id
        .split('/')
        .find(|segment| segment.contains("--"))
        .and_then(|segment| segment.rsplit("--").next())
        .unwrap_or(model_id)
}
