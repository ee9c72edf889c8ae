use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    /// Set by the producer when the token is enqueued
    Pending,
    /// A worker popped the token and owns the job record
    Running,
    /// Terminal: artifacts were published
    Success,
    /// Terminal: the `errors` field holds the cause
    Error,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum JobType {
    /// Run `ilab data generate` on the worker node
    #[strum(serialize = "generate-local")]
    GenerateLocal,
    /// Replay the seed examples through a chat model
    #[strum(serialize = "precheck")]
    Precheck,
    /// Send the seed examples to the remote SDG service
    #[strum(serialize = "sdg-svc")]
    Sdg,
}

/// Scalar entries stored under `jobs:<token>:<field>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum JobField {
    #[strum(serialize = "status")]
    Status,
    #[strum(serialize = "pr_number")]
    PrNumber,
    #[strum(serialize = "job_type")]
    JobType,
    #[strum(serialize = "duration")]
    Duration,
    #[strum(serialize = "errors")]
    Errors,
    #[strum(serialize = "s3_url")]
    S3Url,
    #[strum(serialize = "cmd")]
    Cmd,
    #[strum(serialize = "model_name")]
    ModelName,
}

/// Last external command run on behalf of a job, reported in the `cmd` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandAudit {
    last: Option<String>,
}

impl CommandAudit {
    pub fn record(&mut self, command: impl Into<String>) {
        self.last = Some(command.into());
    }

    pub fn last(&self) -> &str {
        self.last.as_deref().unwrap_or_default()
    }
}
