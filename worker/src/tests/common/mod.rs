pub mod constants;

use crate::core::client::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use crate::core::client::queue::{QueueClient, QueueError};
use crate::core::client::storage::{StorageClient, StorageError};
use crate::types::jobs::types::{JobField, JobStatus, JobType};
use crate::types::queue::QueueType;
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use bytes::Bytes;
use rstest::*;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[fixture]
pub fn work_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create the work dir")
}

/// Queue double with the list and key semantics of the Redis store.
/// Clones share their state, so a test keeps a handle after boxing one into the config.
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    inner: Arc<Mutex<InMemoryState>>,
}

#[derive(Default)]
struct InMemoryState {
    lists: HashMap<QueueType, VecDeque<String>>,
    fields: HashMap<(String, JobField), String>,
}

impl InMemoryQueue {
    /// Does what the bot does when a command is accepted
    pub fn enqueue_job(&self, token: &str, job_type: JobType, pr_number: u64) {
        let mut state = self.inner.lock().unwrap();
        state.fields.insert((token.to_string(), JobField::JobType), job_type.to_string());
        state.fields.insert((token.to_string(), JobField::PrNumber), pr_number.to_string());
        state.fields.insert((token.to_string(), JobField::Status), JobStatus::Pending.to_string());
        state.lists.entry(QueueType::Generate).or_default().push_front(token.to_string());
    }

    pub fn insert_field(&self, token: &str, field: JobField, value: &str) {
        self.inner.lock().unwrap().fields.insert((token.to_string(), field), value.to_string());
    }

    pub fn field(&self, token: &str, field: JobField) -> Option<String> {
        self.inner.lock().unwrap().fields.get(&(token.to_string(), field)).cloned()
    }

    /// Tokens pushed to `queue`, oldest first
    pub fn list(&self, queue: QueueType) -> Vec<String> {
        let state = self.inner.lock().unwrap();
        state.lists.get(&queue).map(|list| list.iter().rev().cloned().collect()).unwrap_or_default()
    }
}

#[async_trait]
impl QueueClient for InMemoryQueue {
    async fn pop_job(&self, queue: QueueType) -> Result<Option<String>, QueueError> {
        Ok(self.inner.lock().unwrap().lists.get_mut(&queue).and_then(|list| list.pop_back()))
    }

    async fn push_job(&self, queue: QueueType, token: &str) -> Result<(), QueueError> {
        self.inner.lock().unwrap().lists.entry(queue).or_default().push_front(token.to_string());
        Ok(())
    }

    async fn set_field(&self, token: &str, field: JobField, value: &str) -> Result<(), QueueError> {
        self.insert_field(token, field, value);
        Ok(())
    }

    async fn get_field(&self, token: &str, field: JobField) -> Result<Option<String>, QueueError> {
        Ok(self.field(token, field))
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Storage double keeping every uploaded object. Keys containing `fail_on` are rejected.
#[derive(Clone, Default)]
pub struct RecordingStorage {
    objects: Arc<Mutex<Vec<StoredObject>>>,
    fail_on: Option<String>,
}

impl RecordingStorage {
    pub fn failing_on(pattern: &str) -> Self {
        Self { objects: Arc::default(), fail_on: Some(pattern.to_string()) }
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects().into_iter().map(|object| object.key).collect()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects().into_iter().find(|object| object.key == key)
    }
}

#[async_trait]
impl StorageClient for RecordingStorage {
    async fn put_data(&self, data: Bytes, key: &str, content_type: &str) -> Result<(), StorageError> {
        if self.fail_on.as_deref().is_some_and(|pattern| key.contains(pattern)) {
            return Err(StorageError::UnableToPutObject(SdkError::construction_failure("bucket unavailable")));
        }
        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Stands in for `git` and `ilab`: a clone materializes the configured taxonomy files,
/// the diff lists them, chat answers every question and generation writes a JSON lines file.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    inner: Arc<Mutex<ScriptState>>,
}

#[derive(Default)]
struct ScriptState {
    taxonomy_files: Vec<(String, String)>,
    diff_output: Option<String>,
    failing_clones: u32,
    failing_chat: Vec<String>,
    failing_generate: bool,
    commands: Vec<CommandSpec>,
}

impl ScriptedRunner {
    pub fn with_taxonomy_file(self, relative_path: &str, content: &str) -> Self {
        self.inner.lock().unwrap().taxonomy_files.push((relative_path.to_string(), content.to_string()));
        self
    }

    pub fn with_diff_output(self, stdout: &str) -> Self {
        self.inner.lock().unwrap().diff_output = Some(stdout.to_string());
        self
    }

    pub fn failing_clones(self, count: u32) -> Self {
        self.inner.lock().unwrap().failing_clones = count;
        self
    }

    /// Chat invocations whose prompt contains `pattern` exit with status 1
    pub fn failing_chat(self, pattern: &str) -> Self {
        self.inner.lock().unwrap().failing_chat.push(pattern.to_string());
        self
    }

    pub fn failing_generate(self) -> Self {
        self.inner.lock().unwrap().failing_generate = true;
        self
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.inner.lock().unwrap().commands.clone()
    }

    /// Prompts passed to `--quick-question`, in order
    pub fn chat_prompts(&self) -> Vec<String> {
        self.commands()
            .iter()
            .filter_map(|spec| {
                let position = spec.args.iter().position(|arg| arg == "--quick-question")?;
                spec.args.get(position + 1).cloned()
            })
            .collect()
    }
}

fn exit(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> CommandOutput {
    CommandOutput { status: Some(status), stdout: stdout.into(), stderr: stderr.into() }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: CommandSpec, cancel: CancellationToken) -> Result<CommandOutput, CommandError> {
        if cancel.is_cancelled() {
            return Err(CommandError::Cancelled { command: spec.to_string() });
        }
        let mut state = self.inner.lock().unwrap();
        state.commands.push(spec.clone());
        let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();

        let output = match args.as_slice() {
            ["clone", _, dest] => {
                if state.failing_clones > 0 {
                    state.failing_clones -= 1;
                    std::fs::create_dir_all(dest).unwrap();
                    return Ok(exit(128, "", "fatal: unable to access remote"));
                }
                let dest = PathBuf::from(dest);
                for (relative_path, content) in &state.taxonomy_files {
                    let path = dest.join(relative_path);
                    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                    std::fs::write(path, content).unwrap();
                }
                exit(0, "", "Cloning into 'taxonomy'...")
            }
            ["fetch", ..] | ["checkout", ..] => exit(0, "", ""),
            ["rev-parse", "HEAD"] => exit(0, format!("{}\n", constants::HEAD_COMMIT), ""),
            ["taxonomy", "diff", ..] => {
                let stdout = state.diff_output.clone().unwrap_or_else(|| {
                    state.taxonomy_files.iter().map(|(path, _)| format!("{}\n", path)).collect::<String>()
                });
                exit(0, stdout, "")
            }
            ["model", "chat", "--quick-question", prompt, ..] => {
                if state.failing_chat.iter().any(|pattern| prompt.contains(pattern.as_str())) {
                    exit(1, "", "chat failed")
                } else {
                    exit(0, constants::MODEL_ANSWER, "")
                }
            }
            ["data", "generate", .., "--output-dir", output_dir] => {
                if state.failing_generate {
                    exit(1, "generating", "model not found")
                } else {
                    std::fs::write(PathBuf::from(output_dir).join("generated.jsonl"), constants::GENERATED_JSONL).unwrap();
                    exit(0, "done", "")
                }
            }
            _ => exit(127, "", format!("unexpected command {}", spec)),
        };
        Ok(output)
    }
}
