use crate::error::job::sdg::SdgError;
use crate::types::constant::SDG_MODEL_ID;
use crate::types::jobs::types::CommandAudit;
use crate::types::params::SdgParams;
use crate::types::taxonomy::{cap_seed_examples, parse_document, TaxonomyDomain, TaxonomyFile};
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Certificate, Identity, StatusCode};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::{Mapping, Value as YamlValue};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Mutual TLS client of the synthetic data generation service
#[derive(Debug, Clone)]
pub struct SdgClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl SdgClient {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// Builds the client from the certificate/key pair and the CA bundle on disk.
    ///
    /// Verification of the server identity is skipped only with `--tls-insecure`.
    pub fn from_params(params: &SdgParams) -> Result<Self, SdgError> {
        let cert = read_tls_file(&params.client_cert)?;
        let key = read_tls_file(&params.client_key)?;
        let ca = read_tls_file(&params.server_ca_cert)?;

        let identity = Identity::from_pem(&[cert, key].concat()).map_err(|e| SdgError::Tls {
            path: params.client_cert.display().to_string(),
            reason: e.to_string(),
        })?;
        let ca = Certificate::from_pem(&ca)
            .map_err(|e| SdgError::Tls { path: params.server_ca_cert.display().to_string(), reason: e.to_string() })?;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity)
            .add_root_certificate(ca)
            .danger_accept_invalid_certs(params.tls_insecure)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(SdgError::ClientBuild)?;

        Ok(Self::new(client, params.endpoint_url.clone()))
    }

    /// Knowledge requests go to the configured endpoint with `skill` replaced by `knowledge`
    pub fn endpoint_for(&self, domain: TaxonomyDomain) -> Result<Url, SdgError> {
        match domain {
            TaxonomyDomain::Skill => Ok(self.endpoint.clone()),
            TaxonomyDomain::Knowledge => {
                let address = self.endpoint.as_str().replace("skill", "knowledge");
                Url::parse(&address).map_err(|e| SdgError::Payload(format!("invalid endpoint {}: {}", address, e)))
            }
        }
    }

    /// POSTs the request body and returns the raw response body of a 200 answer
    pub async fn generate(
        &self,
        domain: TaxonomyDomain,
        body: &JsonValue,
        cancel: &CancellationToken,
    ) -> Result<Bytes, SdgError> {
        let url = self.endpoint_for(domain)?;
        info!(url = %url, domain = %domain, "Posting taxonomy to the SDG service");

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(body);

        let response = tokio::select! {
            response = request.send() => response.map_err(SdgError::Request)?,
            _ = cancel.cancelled() => return Err(SdgError::Cancelled),
        };

        let status = response.status();
        let body = tokio::select! {
            body = response.bytes() => body.map_err(SdgError::ResponseBody)?,
            _ = cancel.cancelled() => return Err(SdgError::Cancelled),
        };

        match status {
            StatusCode::OK => Ok(body),
            code => Err(SdgError::UnexpectedStatus {
                status: code.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}

fn read_tls_file(path: &Path) -> Result<Vec<u8>, SdgError> {
    std::fs::read(path).map_err(|e| SdgError::Tls { path: path.display().to_string(), reason: e.to_string() })
}

/// Sends each changed taxonomy file to the SDG service and stores the answers in the output directory.
pub struct SdgGenerator<'a> {
    client: SdgClient,
    params: &'a SdgParams,
    taxonomy_dir: PathBuf,
    cancel: &'a CancellationToken,
}

impl<'a> SdgGenerator<'a> {
    pub fn new(client: SdgClient, params: &'a SdgParams, taxonomy_dir: PathBuf, cancel: &'a CancellationToken) -> Self {
        Self { client, params, taxonomy_dir, cancel }
    }

    /// Stops at the first file that fails
    pub async fn run(&self, files: &[String], output_dir: &Path, audit: &mut CommandAudit) -> Result<Vec<PathBuf>, SdgError> {
        let mut outputs = Vec::with_capacity(files.len());
        for file in files {
            outputs.push(self.generate_file(file, output_dir, audit).await?);
        }
        Ok(outputs)
    }

    async fn generate_file(&self, file: &str, output_dir: &Path, audit: &mut CommandAudit) -> Result<PathBuf, SdgError> {
        let path = self.taxonomy_dir.join(file);
        let domain = TaxonomyDomain::classify(file);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SdgError::ReadFile { path: path.display().to_string(), source })?;

        let taxonomy_error = |source| SdgError::Taxonomy { path: path.display().to_string(), source };
        let parsed = TaxonomyFile::parse(&content, domain).map_err(taxonomy_error)?;
        for rejected in &parsed.rejected {
            warn!(file = %file, error = %rejected, "Invalid seed example sent to the SDG service as is");
        }

        let mut document = parse_document(&content).map_err(taxonomy_error)?;
        if let Some(original) = cap_seed_examples(&mut document, self.params.max_seed) {
            info!(file = %file, original, max_seed = self.params.max_seed, "Capped seed examples");
            document = trimmed_copy(&document).map_err(taxonomy_error)?;
        }

        let body = build_payload(&document, domain, self.params.num_samples);
        audit.record(body.to_string());

        let response = self.client.generate(domain, &body, self.cancel).await?;

        let output_path = output_dir.join(output_file_name(&path));
        tokio::fs::write(&output_path, &response)
            .await
            .map_err(|source| SdgError::WriteOutput { path: output_path.display().to_string(), source })?;
        debug!(path = %output_path.display(), bytes = response.len(), "Stored SDG response");
        Ok(output_path)
    }
}

/// Writes the capped document to a temporary `filtered-*.yaml` file and decodes it back,
/// so the request carries exactly what the trimmed file holds. The original file is left untouched.
fn trimmed_copy(document: &Mapping) -> Result<Mapping, crate::error::job::taxonomy::TaxonomyError> {
    let yaml = serde_yaml::to_string(document)?;
    match write_temporary(&yaml) {
        Ok(file) => {
            debug!(path = %file.path().display(), "Wrote trimmed taxonomy copy");
            let content = std::fs::read_to_string(file.path()).unwrap_or(yaml);
            parse_document(&content)
        }
        Err(e) => {
            warn!(error = %e, "Could not write trimmed taxonomy copy");
            parse_document(&yaml)
        }
    }
}

fn write_temporary(content: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().prefix("filtered-").suffix(".yaml").tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// `sdg_<unix seconds>_<source file name>.json`
fn output_file_name(source: &Path) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
    let base = source.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    format!("sdg_{}_{}.json", now, base)
}

/// Request body: every field of the taxonomy document plus the model id and the sample count.
/// Knowledge documents keep only `repo`, `commit` and the string `patterns` of their `document`.
pub fn build_payload(document: &Mapping, domain: TaxonomyDomain, num_samples: u32) -> JsonValue {
    let mut body = match yaml_to_json(YamlValue::Mapping(document.clone())) {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    };

    if domain == TaxonomyDomain::Knowledge {
        if let Some(JsonValue::Object(source)) = body.get("document") {
            let mut normalized = Map::new();
            if let Some(JsonValue::String(repo)) = source.get("repo") {
                normalized.insert("repo".to_string(), JsonValue::String(repo.clone()));
            }
            if let Some(JsonValue::String(commit)) = source.get("commit") {
                normalized.insert("commit".to_string(), JsonValue::String(commit.clone()));
            }
            if let Some(JsonValue::Array(patterns)) = source.get("patterns") {
                let patterns = patterns.iter().filter(|pattern| pattern.is_string()).cloned().collect();
                normalized.insert("patterns".to_string(), JsonValue::Array(patterns));
            }
            body.insert("document".to_string(), JsonValue::Object(normalized));
        }
    }

    body.insert("mm_model_id".to_string(), JsonValue::String(SDG_MODEL_ID.to_string()));
    body.insert("num_samples".to_string(), JsonValue::from(num_samples));
    JsonValue::Object(body)
}

/// YAML to JSON, rendering non-string mapping keys as text
fn yaml_to_json(value: YamlValue) -> JsonValue {
    match value {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                JsonValue::from(i)
            } else if let Some(u) = n.as_u64() {
                JsonValue::from(u)
            } else {
                n.as_f64().and_then(serde_json::Number::from_f64).map(JsonValue::Number).unwrap_or(JsonValue::Null)
            }
        }
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(seq) => JsonValue::Array(seq.into_iter().map(yaml_to_json).collect()),
        YamlValue::Mapping(mapping) => {
            JsonValue::Object(mapping.into_iter().map(|(key, value)| (yaml_key(key), yaml_to_json(value))).collect())
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other).map(|s| s.trim_end().to_string()).unwrap_or_default(),
    }
}
