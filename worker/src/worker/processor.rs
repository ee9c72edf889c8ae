use crate::core::client::command::CommandSpec;
use crate::core::config::Config;
use crate::error::job::publish::PublishError;
use crate::error::job::{JobError, JobResult};
use crate::types::constant::TEST_MODE_URL;
use crate::types::jobs::types::{CommandAudit, JobField, JobStatus, JobType};
use crate::worker::diff::changed_taxonomy_files;
use crate::worker::model::{ModelResolver, ResolvedModel};
use crate::worker::notifier::{JobSummary, ResultNotifier};
use crate::worker::precheck::PrecheckEngine;
use crate::worker::publisher::ArtifactPublisher;
use crate::worker::sdg::SdgGenerator;
use crate::worker::workspace::{remove_checkout, GitWorkspace};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, field, info, info_span, warn, Instrument};

/// Runs one popped job token from `running` to a terminal status.
pub struct JobProcessor {
    config: Arc<Config>,
    token: String,
    started_at: SystemTime,
    cancel: CancellationToken,
    /// Set once the job reaches the checkout step, removed again when the job ends
    checkout_dir: Option<PathBuf>,
}

impl JobProcessor {
    pub fn new(config: Arc<Config>, token: String, cancel: CancellationToken) -> Self {
        Self { config, token, started_at: SystemTime::now(), cancel, checkout_dir: None }
    }

    /// Artifacts older than the start of the job are never published
    pub fn with_started_at(mut self, started_at: SystemTime) -> Self {
        self.started_at = started_at;
        self
    }

    /// Processes the job. Every outcome, including failures to read the job record,
    /// ends with a terminal status written and the token pushed to the results queue.
    pub async fn process(self) {
        let span = info_span!("job", job = %self.token, job_type = field::Empty, pr_number = field::Empty);
        self.process_in_span().instrument(span).await
    }

    async fn process_in_span(mut self) {
        let mut audit = CommandAudit::default();
        let outcome = self.execute(&mut audit).await;

        let notifier = ResultNotifier::new(self.config.queue());
        let reported = match outcome {
            Ok(summary) => notifier.report_success(&self.token, &summary).await,
            Err(e) => {
                error!(error = %e, "Job failed");
                notifier.report_error(&self.token, &e.to_string()).await
            }
        };
        if let Err(e) = reported {
            error!(error = %e, "Could not report the job result");
        }

        if let Some(checkout_dir) = &self.checkout_dir {
            if let Err(e) = remove_checkout(checkout_dir).await {
                warn!(error = %e, "Could not remove the taxonomy checkout");
            }
        }
    }

    async fn execute(&mut self, audit: &mut CommandAudit) -> JobResult<JobSummary> {
        let queue = self.config.queue();
        queue.set_field(&self.token, JobField::Status, &JobStatus::Running.to_string()).await?;

        let job_type = self.read_field(JobField::JobType).await?;
        let job_type = JobType::from_str(&job_type).map_err(|_| JobError::UnknownJobType(job_type.clone()))?;
        let pr_number = self.read_field(JobField::PrNumber).await?;
        let pr_number = pr_number.trim().parse::<u64>().map_err(|_| JobError::InvalidPrNumber(pr_number.clone()))?;

        let span = tracing::Span::current();
        span.record("job_type", field::display(job_type));
        span.record("pr_number", pr_number);
        info!("Processing job");

        if self.config.service_params().test_mode {
            return self.run_test_mode().await;
        }

        let job_dir = self.config.ilab_params().job_dir(&self.token);
        let checkout_dir = self.config.ilab_config().taxonomy_dir(&job_dir);
        self.checkout_dir = Some(checkout_dir.clone());

        if tokio::fs::try_exists(&checkout_dir).await.unwrap_or(false) {
            debug!(path = %checkout_dir.display(), "Removing leftover taxonomy checkout");
            remove_checkout(&checkout_dir).await?;
        }

        let head = GitWorkspace::new(self.config.command_runner(), self.config.github_params())
            .checkout(pr_number, &checkout_dir, &self.cancel)
            .await?;

        let out_dir_name = format!("{}-pr-{}-{}", job_type, pr_number, head);
        let output_dir = job_dir.join(&out_dir_name);
        tokio::fs::create_dir_all(&output_dir).await.map_err(|e| JobError::io(&output_dir, e))?;
        info!(out_dir = %output_dir.display(), "Created output directory");

        let model =
            ModelResolver::new(self.config.precheck_params(), self.config.ilab_config()).resolve(job_type, &self.cancel).await;

        match job_type {
            JobType::GenerateLocal => self.generate_local(&checkout_dir, &output_dir, audit).await?,
            JobType::Precheck => self.precheck(&job_dir, &checkout_dir, &output_dir, &model, audit).await?,
            JobType::Sdg => self.sdg(&checkout_dir, &output_dir, audit).await?,
        }

        let storage_args = self.config.storage_params();
        let index_key = ArtifactPublisher::new(self.config.storage(), storage_args)
            .publish(&output_dir, &out_dir_name, &self.token, pr_number, self.started_at)
            .await?
            .ok_or_else(|| PublishError::NothingToPublish(output_dir.display().to_string()))?;

        Ok(JobSummary {
            elapsed: self.started_at.elapsed().unwrap_or_default(),
            url: storage_args.public_url(&index_key),
            cmd: audit.last().to_string(),
            model_name: model.reported_name,
        })
    }

    async fn run_test_mode(&self) -> JobResult<JobSummary> {
        let delay = self.config.service_params().test_mode_delay;
        info!(delay_secs = delay.as_secs(), "Test mode, skipping the pipeline");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => return Err(JobError::Cancelled),
        }
        Ok(JobSummary {
            elapsed: self.started_at.elapsed().unwrap_or_default(),
            url: TEST_MODE_URL.to_string(),
            cmd: String::new(),
            model_name: self.config.ilab_config().model_name(),
        })
    }

    async fn read_field(&self, field: JobField) -> JobResult<String> {
        self.config
            .queue()
            .get_field(&self.token, field)
            .await?
            .ok_or_else(|| JobError::MissingField { token: self.token.clone(), field })
    }

    /// `ilab data generate --num-instructions <n> --taxonomy-path <checkout> [--taxonomy-base <base>] --output-dir <out>`
    async fn generate_local(&self, checkout_dir: &Path, output_dir: &Path, audit: &mut CommandAudit) -> JobResult<()> {
        let ilab = self.config.ilab_params();
        let spec = CommandSpec::new(ilab.lab_binary())
            .args(["data", "generate", "--num-instructions"])
            .arg(ilab.num_instructions.to_string())
            .args(self.config.ilab_config().taxonomy_args(checkout_dir))
            .arg("--output-dir")
            .arg(output_dir.to_string_lossy())
            .current_dir(&ilab.work_dir);
        audit.record(spec.to_string());
        info!(command = %spec, "Running the generate command");

        let output = self.config.command_runner().run(spec.clone(), self.cancel.clone()).await?;
        if !output.success() {
            return Err(JobError::CommandFailed {
                command: spec.to_string(),
                status: output.status_display(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(())
    }

    async fn precheck(
        &self,
        job_dir: &Path,
        checkout_dir: &Path,
        output_dir: &Path,
        model: &ResolvedModel,
        audit: &mut CommandAudit,
    ) -> JobResult<()> {
        let files = self.changed_files(checkout_dir, audit).await?;
        PrecheckEngine::new(&self.config, model, &self.cancel).in_job_dir(job_dir).run(&files, output_dir, audit).await?;
        Ok(())
    }

    async fn sdg(&self, checkout_dir: &Path, output_dir: &Path, audit: &mut CommandAudit) -> JobResult<()> {
        let files = self.changed_files(checkout_dir, audit).await?;
        if files.is_empty() {
            info!("No changed taxonomy files, nothing to send to the SDG service");
            return Ok(());
        }

        let client = self.config.sdg_client()?;
        let outputs = SdgGenerator::new(client, self.config.sdg_params(), checkout_dir.to_path_buf(), &self.cancel)
            .run(&files, output_dir, audit)
            .await?;
        info!(outputs = outputs.len(), "SDG generation completed");
        Ok(())
    }

    async fn changed_files(&self, checkout_dir: &Path, audit: &mut CommandAudit) -> JobResult<Vec<String>> {
        changed_taxonomy_files(
            self.config.command_runner(),
            self.config.ilab_params(),
            self.config.ilab_config(),
            checkout_dir,
            audit,
            &self.cancel,
        )
        .await
    }
}
