use crate::core::client::storage::StorageClient;
use crate::error::job::publish::PublishError;
use crate::types::constant::{CONTEXT_PROMPT, INDEX_FILE_NAME, JSON_VIEWER_SUFFIX, YAML_VIEWER_SUFFIX};
use crate::types::params::StorageArgs;
use crate::worker::render::{render_index, render_json_viewer, render_yaml_viewer, PublishedItem};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

const JSON_CONTENT_TYPE: &str = "application/json-lines+json";
const HTML_CONTENT_TYPE: &str = "text/html";
const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Content type of an uploaded artifact, by file extension
pub fn content_type_for(file_name: &str) -> &'static str {
    if file_name.ends_with(".json") || file_name.ends_with(".jsonl") {
        JSON_CONTENT_TYPE
    } else if file_name.ends_with(".html") {
        HTML_CONTENT_TYPE
    } else {
        TEXT_CONTENT_TYPE
    }
}

/// Removes the context appended to precheck questions. Each redaction runs from the marker
/// to the next blank line, or to the end of the content when there is none.
pub fn redact_context_prompt(content: &str) -> String {
    let mut redacted = String::with_capacity(content.len());
    let mut rest = content;
    while let Some((before, after)) = rest.split_once(CONTEXT_PROMPT) {
        redacted.push_str(before);
        rest = after.find("\n\n").map(|end| &after[end..]).unwrap_or_default();
    }
    redacted.push_str(rest);
    redacted
}

/// Uploads the artifacts a job produced and the index page listing them.
pub struct ArtifactPublisher<'a> {
    storage: &'a dyn StorageClient,
    storage_args: &'a StorageArgs,
}

impl<'a> ArtifactPublisher<'a> {
    pub fn new(storage: &'a dyn StorageClient, storage_args: &'a StorageArgs) -> Self {
        Self { storage, storage_args }
    }

    /// Publishes every file of `output_dir` modified after `job_start` under `<out_dir_name>-job-<token>/`.
    ///
    /// Returns the key of the uploaded index page, or `None` when nothing was published.
    pub async fn publish(
        &self,
        output_dir: &Path,
        out_dir_name: &str,
        token: &str,
        pr_number: u64,
        job_start: SystemTime,
    ) -> Result<Option<String>, PublishError> {
        let prefix = format!("{}-job-{}", out_dir_name, token);
        let files = fresh_files(output_dir, job_start).await?;
        let mut published = Vec::new();

        for (file_name, path) in files {
            let content = match tokio::fs::read(&path).await {
                Ok(content) => content,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Could not read artifact");
                    continue;
                }
            };
            let content = if file_name.ends_with(".log") {
                let redacted = redact_context_prompt(&String::from_utf8_lossy(&content)).into_bytes();
                if redacted != content {
                    if let Err(e) = tokio::fs::write(&path, &redacted).await {
                        error!(path = %path.display(), error = %e, "Could not redact local transcript");
                    }
                }
                redacted
            } else {
                content
            };
            let text = String::from_utf8_lossy(&content).into_owned();

            if file_name.ends_with(".json") || file_name.ends_with(".jsonl") {
                match render_json_viewer(&file_name, &text) {
                    Ok(page) => {
                        let name = format!("{}{}", file_name, JSON_VIEWER_SUFFIX);
                        self.upload(&prefix, &name, page.into_bytes(), &mut published).await;
                    }
                    Err(e) => debug!(file = %file_name, error = %e, "No JSON viewer"),
                }
            }

            if let Some(page) = render_yaml_viewer(&file_name, &text) {
                let stem = Path::new(&file_name)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_name.clone());
                let name = format!("{}{}", stem, YAML_VIEWER_SUFFIX);
                self.upload(&prefix, &name, page.into_bytes(), &mut published).await;
            }

            self.upload(&prefix, &file_name, content, &mut published).await;
        }

        if published.is_empty() {
            warn!(out_dir = %output_dir.display(), "No artifacts were published");
            return Ok(None);
        }

        let index = render_index(pr_number, &published);
        let index_path = output_dir.join(INDEX_FILE_NAME);
        tokio::fs::write(&index_path, &index)
            .await
            .map_err(|source| PublishError::WriteIndex { path: index_path.display().to_string(), source })?;

        let index_key = format!("{}/{}", prefix, INDEX_FILE_NAME);
        self.storage
            .put_data(Bytes::from(index), &index_key, HTML_CONTENT_TYPE)
            .await
            .map_err(PublishError::UploadIndex)?;
        info!(key = %index_key, artifacts = published.len(), "Published job artifacts");
        Ok(Some(index_key))
    }

    /// Upload failures only leave the artifact out of the index
    async fn upload(&self, prefix: &str, name: &str, content: Vec<u8>, published: &mut Vec<PublishedItem>) {
        let key = format!("{}/{}", prefix, name);
        match self.storage.put_data(Bytes::from(content), &key, content_type_for(name)).await {
            Ok(()) => {
                debug!(key = %key, "Uploaded artifact");
                published.push(PublishedItem { name: name.to_string(), url: self.storage_args.public_url(&key) });
            }
            Err(e) => error!(key = %key, error = %e, "Could not upload artifact"),
        }
    }
}

/// Regular files of `dir` modified strictly after `since`, sorted by name
async fn fresh_files(dir: &Path, since: SystemTime) -> Result<Vec<(String, PathBuf)>, PublishError> {
    let read_dir_error = |source| PublishError::ReadDir { path: dir.display().to_string(), source };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_error)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(path = %entry.path().display(), error = %e, "Could not get artifact metadata");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        if modified > since {
            files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        } else {
            debug!(path = %entry.path().display(), "Skipping stale artifact");
        }
    }

    files.sort();
    Ok(files)
}
