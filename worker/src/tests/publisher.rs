use crate::error::job::publish::PublishError;
use crate::tests::common::{work_dir, RecordingStorage};
use crate::tests::config::{test_params, TEST_BUCKET, TEST_REGION};
use crate::types::constant::CONTEXT_PROMPT;
use crate::types::params::StorageArgs;
use crate::worker::publisher::ArtifactPublisher;
use assert_matches::assert_matches;
use rstest::rstest;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const OUT_DIR_NAME: &str = "sdg-svc-pr-7-abc";
const TOKEN: &str = "job-token-1";
const PREFIX: &str = "sdg-svc-pr-7-abc-job-job-token-1";

/// Output directory of a job that started a minute ago, holding one artifact left by an older job
fn job_output(work_dir: &Path, files: &[(&str, &str)]) -> (PathBuf, SystemTime) {
    let dir = work_dir.join(OUT_DIR_NAME);
    std::fs::create_dir_all(&dir).unwrap();

    let stale = dir.join("chat_old.yaml");
    std::fs::write(&stale, "question: old\n").unwrap();
    let file = OpenOptions::new().write(true).open(&stale).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(3600)).unwrap();

    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
    (dir, SystemTime::now() - Duration::from_secs(60))
}

fn storage_args(work_dir: &Path) -> StorageArgs {
    test_params(work_dir).storage
}

fn key(name: &str) -> String {
    format!("{}/{}", PREFIX, name)
}

#[rstest]
#[tokio::test]
async fn fresh_artifacts_and_index_are_published(work_dir: TempDir) {
    let storage = RecordingStorage::default();
    let args = storage_args(work_dir.path());
    let transcript = format!("Input: Summarize {} secret context.\n\nOutput:\nsummary\n", CONTEXT_PROMPT);
    let (dir, started) = job_output(
        work_dir.path(),
        &[("sdg_1_qna.yaml.json", "{\"generated\":[1]}"), ("chat_new.log", &transcript), ("notes.txt", "plain words")],
    );

    let index_key = ArtifactPublisher::new(&storage, &args).publish(&dir, OUT_DIR_NAME, TOKEN, 7, started).await.unwrap();

    assert_eq!(index_key, Some(key("index.html")));
    let keys = storage.keys();
    assert!(!keys.iter().any(|k| k.contains("chat_old")));
    assert_eq!(keys.last(), Some(&key("index.html")));

    let json = storage.object(&key("sdg_1_qna.yaml.json")).unwrap();
    assert_eq!(json.content_type, "application/json-lines+json");
    assert_eq!(&json.data[..], b"{\"generated\":[1]}");
    let viewer = storage.object(&key("sdg_1_qna.yaml.json-viewer.html")).unwrap();
    assert_eq!(viewer.content_type, "text/html");
    assert!(String::from_utf8_lossy(&viewer.data).contains("&quot;generated&quot;"));
    assert_eq!(storage.object(&key("sdg_1_qna.yaml.yaml-viewer.html")).unwrap().content_type, "text/html");

    let log = storage.object(&key("chat_new.log")).unwrap();
    assert_eq!(log.content_type, "text/plain");
    assert_eq!(String::from_utf8_lossy(&log.data), "Input: Summarize \n\nOutput:\nsummary\n");
    assert_eq!(std::fs::read_to_string(dir.join("chat_new.log")).unwrap(), "Input: Summarize \n\nOutput:\nsummary\n");

    assert_eq!(storage.object(&key("notes.txt")).unwrap().content_type, "text/plain");
    assert!(storage.object(&key("notes.yaml-viewer.html")).is_none());

    let index = std::fs::read_to_string(dir.join("index.html")).unwrap();
    assert!(index.contains("Generated Data for PR #7"));
    assert!(index.contains(&format!(
        "<a href=\"https://{}.s3.{}.amazonaws.com/{}\">notes.txt</a>",
        TEST_BUCKET,
        TEST_REGION,
        key("notes.txt")
    )));
    assert!(!index.contains("chat_old"));
    let uploaded_index = storage.object(&key("index.html")).unwrap();
    assert_eq!(uploaded_index.content_type, "text/html");
    assert_eq!(String::from_utf8_lossy(&uploaded_index.data), index);
}

#[rstest]
#[tokio::test]
async fn multi_line_context_never_leaves_the_worker(work_dir: TempDir) {
    let storage = RecordingStorage::default();
    let args = storage_args(work_dir.path());
    let combined = format!(
        "\n\n----- chat_1.log -----\n\n\nInput: Summarize {} SECRET line one\nSECRET line two\nSECRET line three.\n\nOutput:\nmodel says hi\n",
        CONTEXT_PROMPT
    );
    let (dir, started) = job_output(work_dir.path(), &[("combined_chatlogs.log", &combined), ("chat_1.yaml", "question: q\n")]);

    ArtifactPublisher::new(&storage, &args).publish(&dir, OUT_DIR_NAME, TOKEN, 7, started).await.unwrap();

    let published = String::from_utf8_lossy(&storage.object(&key("combined_chatlogs.log")).unwrap().data).into_owned();
    assert!(!published.contains("SECRET"));
    assert!(published.ends_with("Input: Summarize \n\nOutput:\nmodel says hi\n"));
    assert!(!std::fs::read_to_string(dir.join("combined_chatlogs.log")).unwrap().contains("SECRET"));
}

#[rstest]
#[tokio::test]
async fn failed_uploads_are_left_out_of_the_index(work_dir: TempDir) {
    let storage = RecordingStorage::failing_on("notes");
    let args = storage_args(work_dir.path());
    let (dir, started) = job_output(work_dir.path(), &[("notes.txt", "plain words"), ("generated.jsonl", "{\"a\":1}\n")]);

    let index_key = ArtifactPublisher::new(&storage, &args).publish(&dir, OUT_DIR_NAME, TOKEN, 7, started).await.unwrap();

    assert!(index_key.is_some());
    let index = std::fs::read_to_string(dir.join("index.html")).unwrap();
    assert!(index.contains(">generated.jsonl</a>"));
    assert!(!index.contains("notes.txt"));
}

#[rstest]
#[tokio::test]
async fn nothing_fresh_publishes_nothing(work_dir: TempDir) {
    let storage = RecordingStorage::default();
    let args = storage_args(work_dir.path());
    let (dir, started) = job_output(work_dir.path(), &[]);

    let index_key = ArtifactPublisher::new(&storage, &args).publish(&dir, OUT_DIR_NAME, TOKEN, 7, started).await.unwrap();

    assert_eq!(index_key, None);
    assert!(storage.objects().is_empty());
    assert!(!dir.join("index.html").exists());
}

#[rstest]
#[tokio::test]
async fn index_upload_failure_is_an_error(work_dir: TempDir) {
    let storage = RecordingStorage::failing_on("index.html");
    let args = storage_args(work_dir.path());
    let (dir, started) = job_output(work_dir.path(), &[("notes.txt", "plain words")]);

    let result = ArtifactPublisher::new(&storage, &args).publish(&dir, OUT_DIR_NAME, TOKEN, 7, started).await;

    assert_matches!(result, Err(PublishError::UploadIndex(_)));
    assert_eq!(storage.keys(), vec![key("notes.txt")]);
}

#[rstest]
#[tokio::test]
async fn missing_output_directory(work_dir: TempDir) {
    let storage = RecordingStorage::default();
    let args = storage_args(work_dir.path());

    let result = ArtifactPublisher::new(&storage, &args)
        .publish(&work_dir.path().join("missing"), OUT_DIR_NAME, TOKEN, 7, SystemTime::now())
        .await;

    assert_matches!(result, Err(PublishError::ReadDir { .. }));
}

#[rstest]
#[tokio::test]
async fn directories_are_not_artifacts(work_dir: TempDir) {
    let storage = RecordingStorage::default();
    let args = storage_args(work_dir.path());
    let (dir, started) = job_output(work_dir.path(), &[]);
    std::fs::create_dir(dir.join("nested")).unwrap();
    File::create(dir.join("nested").join("inner.txt")).unwrap();

    let index_key = ArtifactPublisher::new(&storage, &args).publish(&dir, OUT_DIR_NAME, TOKEN, 7, started).await.unwrap();

    assert_eq!(index_key, None);
}
