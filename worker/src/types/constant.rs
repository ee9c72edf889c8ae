use std::time::Duration;

/// Endpoint of a model served on the worker node itself
pub const LOCAL_ENDPOINT: &str = "http://localhost:8000/v1";

/// Model id injected into every SDG request body
pub const SDG_MODEL_ID: &str = "mistralai/mixtral-8x7b-instruct-v0-1";
/// Model name reported for `sdg-svc` jobs
pub const SDG_REPORTED_MODEL_NAME: &str = "sdg service backend";
/// Reported when the remote model listing cannot be queried
pub const DEFAULT_MODEL_NAME: &str = "granite-7b-lab";
/// Reported when neither the endpoint nor the ilab config name a model
pub const UNKNOWN_MODEL_NAME: &str = "unknown";

/// Appended, with the context, to skill questions sent to the chat command
pub const CONTEXT_PROMPT: &str = "Answer this based on the following context:";

pub const GIT_MAX_ATTEMPTS: u32 = 5;
pub const GIT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Spacing between two precheck examples. Transcript names have a one second resolution.
pub const PRECHECK_EXAMPLE_SPACING: Duration = Duration::from_secs(1);

pub const TEST_MODE_DELAY: Duration = Duration::from_secs(10);
pub const TEST_MODE_URL: &str = "https://example.com";

pub const TAXONOMY_EXTENSION: &str = ".yaml";
pub const KNOWLEDGE_FOLDER: &str = "knowledge/";

pub const JSON_VIEWER_SUFFIX: &str = "-viewer.html";
pub const YAML_VIEWER_SUFFIX: &str = ".yaml-viewer.html";
pub const INDEX_FILE_NAME: &str = "index.html";

pub const COMBINED_CHATLOGS_YAML: &str = "combined_chatlogs.yaml";
pub const COMBINED_CHATLOGS_LOG: &str = "combined_chatlogs.log";
pub const COMBINED_CHATLOGS_HTML: &str = "combined_chatlogs.html";

/// Timestamp layout of the per-example precheck artifacts
pub const CHATLOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H_%M_%S";
