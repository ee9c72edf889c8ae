use crate::error::WorkerError;
use crate::types::constant::UNKNOWN_MODEL_NAME;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The subset of the InstructLab `config.yaml` the worker reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct IlabConfig {
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub generate: GenerateSection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChatSection {
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GenerateSection {
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: PathBuf,
    /// Branch the pull request is diffed against, `ilab` picks its own default when empty
    #[serde(default)]
    pub taxonomy_base: String,
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("data/chatlogs")
}

fn default_taxonomy_path() -> PathBuf {
    PathBuf::from("taxonomy")
}

impl Default for ChatSection {
    fn default() -> Self {
        Self { logs_dir: default_logs_dir() }
    }
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self { model: String::new(), taxonomy_path: default_taxonomy_path(), taxonomy_base: String::new() }
    }
}

impl IlabConfig {
    pub fn from_file(path: &Path) -> Result<Self, WorkerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkerError::IlabConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
            .map_err(|e| WorkerError::IlabConfigError(format!("failed to decode {}: {}", path.display(), e)))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Name of the generation model, the last path segment of `generate.model`
    pub fn model_name(&self) -> String {
        Path::new(self.generate.model.trim())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_MODEL_NAME.to_string())
    }

    /// Checkout location of the taxonomy tree for a job running in `job_dir`
    pub fn taxonomy_dir(&self, job_dir: &Path) -> PathBuf {
        job_dir.join(&self.generate.taxonomy_path)
    }

    pub fn chatlog_dir(&self, job_dir: &Path) -> PathBuf {
        job_dir.join(&self.chat.logs_dir)
    }

    /// `--taxonomy-path <checkout> [--taxonomy-base <base>]`, shared by the diff and generate commands
    pub fn taxonomy_args(&self, taxonomy_dir: &Path) -> Vec<String> {
        let mut args = vec!["--taxonomy-path".to_string(), taxonomy_dir.to_string_lossy().into_owned()];
        let base = self.generate.taxonomy_base.trim();
        if !base.is_empty() {
            args.extend(["--taxonomy-base".to_string(), base.to_string()]);
        }
        args
    }
}
