use crate::core::client::queue::{QueueClient, QueueError};
use crate::types::jobs::types::{JobField, JobStatus};
use crate::types::queue::QueueType;
use std::time::Duration;
use tracing::{error, info};

/// What a successful job reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub elapsed: Duration,
    pub url: String,
    pub cmd: String,
    pub model_name: String,
}

/// Writes the terminal state of a job and hands its token to the results queue.
///
/// A failed field write is logged and the remaining writes still happen. Only the
/// results push failing is returned, since downstream never hears about the job then.
pub struct ResultNotifier<'a> {
    queue: &'a dyn QueueClient,
}

impl<'a> ResultNotifier<'a> {
    pub fn new(queue: &'a dyn QueueClient) -> Self {
        Self { queue }
    }

    pub async fn report_success(&self, token: &str, summary: &JobSummary) -> Result<(), QueueError> {
        let duration = elapsed_seconds(summary.elapsed).to_string();
        let status = JobStatus::Success.to_string();
        let fields = [
            (JobField::Duration, duration.as_str()),
            (JobField::Status, status.as_str()),
            (JobField::S3Url, summary.url.as_str()),
            (JobField::Cmd, summary.cmd.as_str()),
            (JobField::ModelName, summary.model_name.as_str()),
        ];
        self.write_fields(token, &fields).await;
        self.push_result(token).await?;
        info!(url = %summary.url, duration, "Job completed");
        Ok(())
    }

    pub async fn report_error(&self, token: &str, message: &str) -> Result<(), QueueError> {
        let status = JobStatus::Error.to_string();
        let fields = [(JobField::Errors, message), (JobField::Status, status.as_str())];
        self.write_fields(token, &fields).await;
        self.push_result(token).await?;
        info!(error = %message, "Job failed");
        Ok(())
    }

    async fn write_fields(&self, token: &str, fields: &[(JobField, &str)]) {
        for (field, value) in fields {
            if let Err(e) = self.queue.set_field(token, *field, value).await {
                error!(field = %field, error = %e, "Could not write job field");
            }
        }
    }

    async fn push_result(&self, token: &str) -> Result<(), QueueError> {
        self.queue.push_job(QueueType::Results, token).await.inspect_err(|e| {
            error!(error = %e, "Could not push job to the results queue");
        })
    }
}

/// Whole seconds, rounded up
pub fn elapsed_seconds(elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs();
    if elapsed.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
