use crate::core::config::Config;
use crate::tests::common::constants::{HEAD_COMMIT, SKILL_PATH, SKILL_QNA, SKILL_QNA_MISSING_ANSWER};
use crate::tests::common::{work_dir, InMemoryQueue, RecordingStorage, ScriptedRunner};
use crate::tests::config::TestConfigBuilder;
use crate::types::constant::TEST_MODE_URL;
use crate::types::ilab_config::IlabConfig;
use crate::types::jobs::types::{JobField, JobType};
use crate::types::queue::QueueType;
use crate::worker::processor::JobProcessor;
use crate::worker::sdg::SdgClient;
use httpmock::prelude::*;
use rstest::rstest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;

const TOKEN: &str = "c4ca4238a0b923820dcc509a6f75849b";

async fn run_job(config: Arc<Config>) {
    run_job_with_token(config, TOKEN).await
}

async fn run_job_with_token(config: Arc<Config>, token: &str) {
    JobProcessor::new(config, token.to_string(), CancellationToken::new())
        .with_started_at(SystemTime::now() - Duration::from_secs(5))
        .process()
        .await;
}

fn job_dir(work_dir: &Path, token: &str) -> PathBuf {
    work_dir.join(format!("job-{}", token))
}

struct Harness {
    queue: InMemoryQueue,
    storage: RecordingStorage,
    runner: ScriptedRunner,
}

impl Harness {
    fn new(runner: ScriptedRunner) -> Self {
        Self { queue: InMemoryQueue::default(), storage: RecordingStorage::default(), runner }
    }

    fn config(&self, work_dir: &TempDir) -> TestConfigBuilder {
        TestConfigBuilder::new(work_dir.path())
            .mock_queue(Box::new(self.queue.clone()))
            .mock_storage_client(Box::new(self.storage.clone()))
            .mock_command_runner(Box::new(self.runner.clone()))
    }

    fn field(&self, field: JobField) -> Option<String> {
        self.queue.field(TOKEN, field)
    }

    fn assert_failed_with(&self, prefix: &str) -> String {
        assert_eq!(self.field(JobField::Status).as_deref(), Some("error"));
        assert_eq!(self.field(JobField::S3Url), None);
        assert_eq!(self.queue.list(QueueType::Results), vec![TOKEN]);
        let errors = self.field(JobField::Errors).unwrap();
        assert!(errors.starts_with(prefix), "unexpected errors field: {}", errors);
        errors
    }
}

#[rstest]
#[tokio::test]
async fn generate_local_publishes_the_generated_data(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default().with_taxonomy_file(SKILL_PATH, SKILL_QNA));
    harness.queue.enqueue_job(TOKEN, JobType::GenerateLocal, 42);

    run_job(harness.config(&work_dir).build()).await;

    let out_dir_name = format!("generate-local-pr-42-{}", HEAD_COMMIT);
    let job_dir = job_dir(work_dir.path(), TOKEN);
    let output_dir = job_dir.join(&out_dir_name);
    assert_eq!(harness.field(JobField::Status).as_deref(), Some("success"));
    assert_eq!(
        harness.field(JobField::S3Url).unwrap(),
        format!("https://instruct-lab-bot-test.s3.us-east-2.amazonaws.com/{}-job-{}/index.html", out_dir_name, TOKEN)
    );
    assert_eq!(
        harness.field(JobField::Cmd).unwrap(),
        format!(
            "ilab data generate --num-instructions 10 --taxonomy-path {} --output-dir {}",
            job_dir.join("taxonomy").display(),
            output_dir.display()
        )
    );
    assert_eq!(harness.field(JobField::ModelName).as_deref(), Some("unknown"));
    assert!(harness.field(JobField::Duration).unwrap().parse::<u64>().unwrap() >= 5);
    assert_eq!(harness.field(JobField::Errors), None);
    assert_eq!(harness.queue.list(QueueType::Results), vec![TOKEN]);

    let prefix = format!("{}-job-{}", out_dir_name, TOKEN);
    let keys = harness.storage.keys();
    assert!(keys.contains(&format!("{}/generated.jsonl", prefix)));
    assert!(keys.contains(&format!("{}/generated.jsonl-viewer.html", prefix)));
    assert!(output_dir.join("index.html").exists());
    assert!(!job_dir.join("taxonomy").exists());
}

#[rstest]
#[tokio::test]
async fn precheck_skips_the_malformed_example(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default().with_taxonomy_file(SKILL_PATH, SKILL_QNA_MISSING_ANSWER));
    harness.queue.enqueue_job(TOKEN, JobType::Precheck, 7);

    run_job(harness.config(&work_dir).build()).await;

    assert_eq!(harness.field(JobField::Status).as_deref(), Some("success"));
    assert_eq!(harness.runner.chat_prompts(), vec!["Tell me a joke about cats", "What is a pun?"]);
    assert_eq!(harness.field(JobField::Cmd).as_deref(), Some("ilab model chat --quick-question What is a pun?"));
    let keys = harness.storage.keys();
    assert!(keys.iter().any(|key| key.ends_with("/combined_chatlogs.yaml")));
    assert_eq!(keys.iter().filter(|key| key.contains("/chat_") && key.ends_with(".log")).count(), 2);
}

#[rstest]
#[tokio::test]
async fn precheck_without_changed_files_fails(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default().with_diff_output("README.md\n"));
    harness.queue.enqueue_job(TOKEN, JobType::Precheck, 7);

    run_job(harness.config(&work_dir).build()).await;

    harness.assert_failed_with("No modified YAML files detected in the PR for precheck");
    assert!(harness.runner.chat_prompts().is_empty());
}

#[rstest]
#[tokio::test]
async fn sdg_service_error_fails_the_job(work_dir: TempDir) {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/skill/generate");
            then.status(500).body("internal error");
        })
        .await;
    let harness = Harness::new(ScriptedRunner::default().with_taxonomy_file(SKILL_PATH, SKILL_QNA));
    harness.queue.enqueue_job(TOKEN, JobType::Sdg, 9);
    let client = SdgClient::new(reqwest::Client::new(), Url::parse(&server.url("/skill/generate")).unwrap());

    run_job(harness.config(&work_dir).mock_sdg_client(client).build()).await;

    mock.assert_async().await;
    let errors = harness.assert_failed_with("unexpected status code 500");
    assert!(errors.contains("internal error"));
    assert!(harness.storage.objects().is_empty());
}

#[rstest]
#[tokio::test]
async fn sdg_publishes_the_service_answer(work_dir: TempDir) {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/skill/generate");
            then.status(200).body("{\"samples\":[]}");
        })
        .await;
    let harness = Harness::new(ScriptedRunner::default().with_taxonomy_file(SKILL_PATH, SKILL_QNA));
    harness.queue.enqueue_job(TOKEN, JobType::Sdg, 9);
    let client = SdgClient::new(reqwest::Client::new(), Url::parse(&server.url("/skill/generate")).unwrap());

    run_job(harness.config(&work_dir).mock_sdg_client(client).build()).await;

    assert_eq!(harness.field(JobField::Status).as_deref(), Some("success"));
    assert_eq!(harness.field(JobField::ModelName).as_deref(), Some("sdg service backend"));
    assert!(harness.field(JobField::Cmd).unwrap().contains("\"mm_model_id\""));
    assert!(harness.storage.keys().iter().any(|key| key.contains("/sdg_") && key.ends_with("_qna.yaml.json")));
}

#[rstest]
#[tokio::test]
async fn sdg_without_changed_files_has_nothing_to_publish(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default().with_diff_output(""));
    harness.queue.enqueue_job(TOKEN, JobType::Sdg, 9);

    run_job(harness.config(&work_dir).build()).await;

    harness.assert_failed_with("No publishable artifacts found in");
}

#[rstest]
#[tokio::test]
async fn test_mode_skips_the_pipeline(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default());
    harness.queue.enqueue_job(TOKEN, JobType::GenerateLocal, 42);

    run_job(harness.config(&work_dir).configure(|params| params.service.test_mode = true).build()).await;

    assert_eq!(harness.field(JobField::Status).as_deref(), Some("success"));
    assert_eq!(harness.field(JobField::S3Url).as_deref(), Some(TEST_MODE_URL));
    assert_eq!(harness.field(JobField::Cmd).as_deref(), Some(""));
    assert_eq!(harness.field(JobField::ModelName).as_deref(), Some("unknown"));
    assert!(harness.runner.commands().is_empty());
    assert!(harness.storage.objects().is_empty());
}

#[rstest]
#[case(Some("fine-tune"), Some("42"), "Unknown job type: fine-tune")]
#[case(None, Some("42"), "Field job_type is not set for job c4ca4238a0b923820dcc509a6f75849b")]
#[case(Some("precheck"), None, "Field pr_number is not set for job")]
#[case(Some("precheck"), Some("forty-two"), "Invalid pull request number \"forty-two\"")]
#[tokio::test]
async fn invalid_job_records_fail(
    work_dir: TempDir,
    #[case] job_type: Option<&str>,
    #[case] pr_number: Option<&str>,
    #[case] expected: &str,
) {
    let harness = Harness::new(ScriptedRunner::default());
    if let Some(job_type) = job_type {
        harness.queue.insert_field(TOKEN, JobField::JobType, job_type);
    }
    if let Some(pr_number) = pr_number {
        harness.queue.insert_field(TOKEN, JobField::PrNumber, pr_number);
    }

    run_job(harness.config(&work_dir).build()).await;

    harness.assert_failed_with(expected);
    assert!(harness.runner.commands().is_empty());
}

#[rstest]
#[tokio::test]
async fn checkout_failure_is_a_git_error(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default().failing_clones(3));
    harness.queue.enqueue_job(TOKEN, JobType::GenerateLocal, 42);

    run_job(harness.config(&work_dir).build()).await;

    let errors = harness.assert_failed_with("git operations error: checkout failed after 3 attempts");
    assert!(!errors.contains("ghp_test_token"));
    assert!(!job_dir(work_dir.path(), TOKEN).join("taxonomy").exists());
}

#[rstest]
#[tokio::test]
async fn failing_generation_reports_the_command(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default().failing_generate());
    harness.queue.enqueue_job(TOKEN, JobType::GenerateLocal, 42);

    run_job(harness.config(&work_dir).build()).await;

    let errors = harness.assert_failed_with("Error running command (ilab data generate --num-instructions 10");
    assert!(errors.contains("exit status 1"));
    assert!(errors.contains("stderr: model not found"));
}

#[rstest]
#[tokio::test]
async fn leftover_checkout_is_replaced_and_removed(work_dir: TempDir) {
    let stale = job_dir(work_dir.path(), TOKEN).join("taxonomy").join("stale.yaml");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, "stale").unwrap();
    let other = job_dir(work_dir.path(), "other").join("taxonomy").join("qna.yaml");
    std::fs::create_dir_all(other.parent().unwrap()).unwrap();
    std::fs::write(&other, "in use").unwrap();
    let harness = Harness::new(ScriptedRunner::default());
    harness.queue.enqueue_job(TOKEN, JobType::GenerateLocal, 42);

    run_job(harness.config(&work_dir).build()).await;

    assert_eq!(harness.field(JobField::Status).as_deref(), Some("success"));
    assert!(!job_dir(work_dir.path(), TOKEN).join("taxonomy").exists());
    assert_eq!(std::fs::read_to_string(other).unwrap(), "in use");
}

#[rstest]
#[tokio::test]
async fn concurrent_jobs_never_share_a_checkout(work_dir: TempDir) {
    const OTHER: &str = "c81e728d9d4c2f636f067f89cc14862c";
    let harness = Harness::new(ScriptedRunner::default().with_taxonomy_file(SKILL_PATH, SKILL_QNA));
    harness.queue.enqueue_job(TOKEN, JobType::Precheck, 7);
    harness.queue.enqueue_job(OTHER, JobType::Precheck, 8);
    let config = harness.config(&work_dir).configure(|params| params.service.max_concurrent_jobs = 2).build();

    tokio::join!(run_job_with_token(config.clone(), TOKEN), run_job_with_token(config, OTHER));

    assert_eq!(harness.field(JobField::Status).as_deref(), Some("success"));
    assert_eq!(harness.queue.field(OTHER, JobField::Status).as_deref(), Some("success"));
    let mut clones: Vec<String> =
        harness.runner.commands().into_iter().filter(|spec| spec.args[0] == "clone").map(|spec| spec.args[2].clone()).collect();
    clones.sort();
    let mut expected = vec![
        job_dir(work_dir.path(), TOKEN).join("taxonomy").display().to_string(),
        job_dir(work_dir.path(), OTHER).join("taxonomy").display().to_string(),
    ];
    expected.sort();
    assert_eq!(clones, expected);
    let keys = harness.storage.keys();
    assert!(keys.iter().any(|key| key.starts_with("precheck-pr-7-") && key.ends_with("/combined_chatlogs.yaml")));
    assert!(keys.iter().any(|key| key.starts_with("precheck-pr-8-") && key.ends_with("/combined_chatlogs.yaml")));
}

#[rstest]
#[tokio::test]
async fn diff_runs_against_the_job_checkout(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default().with_taxonomy_file(SKILL_PATH, SKILL_QNA));
    harness.queue.enqueue_job(TOKEN, JobType::Precheck, 7);
    let mut ilab_config = IlabConfig::default();
    ilab_config.generate.taxonomy_base = "origin/main".to_string();

    run_job(harness.config(&work_dir).ilab_config(ilab_config).build()).await;

    assert_eq!(harness.field(JobField::Status).as_deref(), Some("success"));
    let diff = harness.runner.commands().into_iter().find(|spec| spec.args[0] == "taxonomy").unwrap();
    assert_eq!(
        diff.args,
        vec![
            "taxonomy".to_string(),
            "diff".to_string(),
            "--taxonomy-path".to_string(),
            job_dir(work_dir.path(), TOKEN).join("taxonomy").display().to_string(),
            "--taxonomy-base".to_string(),
            "origin/main".to_string(),
        ]
    );
    assert_eq!(diff.current_dir.as_deref(), Some(work_dir.path()));
}

#[rstest]
#[tokio::test]
async fn cancelled_job_still_reports(work_dir: TempDir) {
    let harness = Harness::new(ScriptedRunner::default());
    harness.queue.enqueue_job(TOKEN, JobType::GenerateLocal, 42);
    let config = harness
        .config(&work_dir)
        .configure(|params| {
            params.service.test_mode = true;
            params.service.test_mode_delay = Duration::from_secs(60);
        })
        .build();
    let cancel = CancellationToken::new();
    cancel.cancel();

    JobProcessor::new(config, TOKEN.to_string(), cancel).process().await;

    harness.assert_failed_with("Job was cancelled");
}
