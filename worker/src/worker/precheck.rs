use crate::core::client::command::{CommandRunner, CommandSpec};
use crate::core::config::Config;
use crate::error::job::precheck::PrecheckError;
use crate::types::constant::{
    CHATLOG_TIMESTAMP_FORMAT, COMBINED_CHATLOGS_HTML, COMBINED_CHATLOGS_LOG, COMBINED_CHATLOGS_YAML, CONTEXT_PROMPT,
    UNKNOWN_MODEL_NAME,
};
use crate::types::ilab_config::IlabConfig;
use crate::types::jobs::types::CommandAudit;
use crate::types::params::{IlabParams, PrecheckParams};
use crate::types::taxonomy::{SeedExamples, TaxonomyDomain, TaxonomyFile};
use crate::worker::model::ResolvedModel;
use crate::worker::render::render_combined_chatlogs;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new("-{2,}").expect("valid hyphen pattern"));

/// Escapes every run of two or more hyphens (`--flag` becomes `\-\-flag`) so the chat
/// command does not read question text as an option.
pub fn escape_hyphens(input: &str) -> String {
    HYPHEN_RUN.replace_all(input, |caps: &regex::Captures| "\\-".repeat(caps[0].len())).into_owned()
}

/// One chat invocation derived from a seed example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecheckQuestion {
    pub domain: TaxonomyDomain,
    /// Text passed to `--quick-question`
    pub prompt: String,
    pub question: String,
    pub answer: String,
    pub context: Option<String>,
}

impl PrecheckQuestion {
    /// Skill questions carry their context inside the prompt. Knowledge prompts never do.
    pub fn from_examples(examples: &SeedExamples) -> Vec<Self> {
        match examples {
            SeedExamples::Skill(skills) => skills
                .iter()
                .map(|seed| {
                    let mut prompt = escape_hyphens(&seed.question);
                    if let Some(context) = &seed.context {
                        prompt = format!("{} {} {}.", prompt, CONTEXT_PROMPT, escape_hyphens(context));
                    }
                    Self {
                        domain: TaxonomyDomain::Skill,
                        prompt,
                        question: seed.question.clone(),
                        answer: seed.answer.clone(),
                        context: seed.context.clone(),
                    }
                })
                .collect(),
            SeedExamples::Knowledge(seeds) => seeds
                .iter()
                .flat_map(|seed| {
                    seed.questions_and_answers.iter().map(|qna| Self {
                        domain: TaxonomyDomain::Knowledge,
                        prompt: escape_hyphens(&qna.question),
                        question: qna.question.clone(),
                        answer: qna.answer.clone(),
                        context: Some(seed.context.clone()),
                    })
                })
                .collect(),
        }
    }

    fn transcript(&self, model_answer: &str) -> String {
        match self.domain {
            TaxonomyDomain::Skill => format!("Input: {}\n\nOutput:\n{}\n", self.question, model_answer),
            TaxonomyDomain::Knowledge => format!(
                "Context:\n{}\nQuestion:\n{}\nOriginalAnswer:\n{}\nModelAnswer:\n{}\n",
                self.context.as_deref().unwrap_or_default(),
                self.question,
                self.answer,
                model_answer
            ),
        }
    }
}

#[derive(Serialize)]
struct ChatRecord<'a> {
    question: &'a str,
    #[serde(rename = "original-answer")]
    original_answer: &'a str,
    #[serde(rename = "model-answer")]
    model_answer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
}

/// The two artifacts written for one answered example
#[derive(Debug, Clone)]
pub struct Chatlog {
    pub record: PathBuf,
    pub transcript: PathBuf,
}

/// Replays the seed examples of the changed taxonomy files through `ilab model chat`.
pub struct PrecheckEngine<'a> {
    runner: &'a dyn CommandRunner,
    ilab: &'a IlabParams,
    ilab_config: &'a IlabConfig,
    params: &'a PrecheckParams,
    model: &'a ResolvedModel,
    cancel: &'a CancellationToken,
    /// Holds the taxonomy checkout and the chatlog dir
    job_dir: &'a Path,
}

impl<'a> PrecheckEngine<'a> {
    pub fn new(config: &'a Config, model: &'a ResolvedModel, cancel: &'a CancellationToken) -> Self {
        Self {
            runner: config.command_runner(),
            ilab: config.ilab_params(),
            ilab_config: config.ilab_config(),
            params: config.precheck_params(),
            model,
            cancel,
            job_dir: &config.ilab_params().work_dir,
        }
    }

    pub fn in_job_dir(mut self, job_dir: &'a Path) -> Self {
        self.job_dir = job_dir;
        self
    }

    /// Checks every file, stopping at the first one that cannot be decoded. The chatlogs
    /// produced so far are assembled into `output_dir` in every case.
    pub async fn run(&self, files: &[String], output_dir: &Path, audit: &mut CommandAudit) -> Result<(), PrecheckError> {
        if files.is_empty() {
            return Err(PrecheckError::NoModifiedFiles);
        }

        let chatlog_dir = self.ilab_config.chatlog_dir(self.job_dir);
        tokio::fs::create_dir_all(&chatlog_dir)
            .await
            .map_err(|source| PrecheckError::ChatlogDir { path: chatlog_dir.display().to_string(), source })?;

        let mut chatlogs = Vec::new();
        let result = self.check_files(files, &chatlog_dir, &mut chatlogs, audit).await;
        assemble_chatlogs(&chatlogs, output_dir).await;
        result
    }

    async fn check_files(
        &self,
        files: &[String],
        chatlog_dir: &Path,
        chatlogs: &mut Vec<Chatlog>,
        audit: &mut CommandAudit,
    ) -> Result<(), PrecheckError> {
        let taxonomy_dir = self.ilab_config.taxonomy_dir(self.job_dir);

        for file in files {
            let path = taxonomy_dir.join(file);
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| PrecheckError::ReadFile { path: path.display().to_string(), source })?;

            let domain = TaxonomyDomain::classify(file);
            let taxonomy = TaxonomyFile::parse(&content, domain)
                .map_err(|source| PrecheckError::Taxonomy { path: path.display().to_string(), source })?;
            for rejected in &taxonomy.rejected {
                error!(file = %file, error = %rejected, "Skipping invalid seed example");
            }
            info!(file = %file, domain = %domain, questions = taxonomy.unit_count(), "Running precheck");

            for question in PrecheckQuestion::from_examples(&taxonomy.examples) {
                if let Some(chatlog) = self.ask(&question, chatlog_dir, audit).await? {
                    chatlogs.push(chatlog);
                }
            }
        }
        Ok(())
    }

    /// Runs one chat invocation. A failed invocation is logged and yields no chatlog.
    async fn ask(
        &self,
        question: &PrecheckQuestion,
        chatlog_dir: &Path,
        audit: &mut CommandAudit,
    ) -> Result<Option<Chatlog>, PrecheckError> {
        let spec = self.chat_command(&question.prompt);
        audit.record(spec.to_string());
        info!(command = %spec, domain = %question.domain, "Running the precheck command");

        let output = self.runner.run(spec, self.cancel.clone()).await?;
        if !output.success() {
            error!(status = %output.status_display(), stderr = %output.stderr.trim(), "Precheck command failed");
            return Ok(None);
        }

        let record = ChatRecord {
            question: &question.question,
            original_answer: &question.answer,
            model_answer: &output.stdout,
            context: question.context.as_deref(),
        };
        let record = match serde_yaml::to_string(&record) {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "Could not encode the precheck record");
                return Ok(None);
            }
        };

        let stem = unique_chatlog_stem(chatlog_dir).await;
        let chatlog = Chatlog {
            record: chatlog_dir.join(format!("{}.yaml", stem)),
            transcript: chatlog_dir.join(format!("{}.log", stem)),
        };
        if let Err(e) = tokio::fs::write(&chatlog.record, record).await {
            error!(path = %chatlog.record.display(), error = %e, "Could not write precheck record");
            return Ok(None);
        }
        if let Err(e) = tokio::fs::write(&chatlog.transcript, question.transcript(&output.stdout)).await {
            error!(path = %chatlog.transcript.display(), error = %e, "Could not write precheck transcript");
            return Ok(None);
        }

        tokio::select! {
            _ = tokio::time::sleep(self.params.example_spacing) => {}
            _ = self.cancel.cancelled() => return Err(PrecheckError::Cancelled),
        }
        Ok(Some(chatlog))
    }

    /// `ilab model chat --quick-question <prompt> [--tls-insecure] [--endpoint-url <url> --model <id>] [--api-key <key>]`
    pub fn chat_command(&self, prompt: &str) -> CommandSpec {
        let mut spec = CommandSpec::new(self.ilab.lab_binary())
            .args(["model", "chat", "--quick-question"])
            .arg(prompt)
            .current_dir(&self.ilab.work_dir);
        if self.params.tls_insecure {
            spec = spec.arg("--tls-insecure");
        }
        if self.params.is_remote() && self.model.command_model != UNKNOWN_MODEL_NAME {
            spec = spec.args([
                "--endpoint-url",
                self.params.endpoint_url.as_str(),
                "--model",
                self.model.command_model.as_str(),
            ]);
        }
        if let Some(api_key) = &self.params.api_key {
            spec = spec.args(["--api-key", api_key.as_str()]).secret(api_key.as_str());
        }
        spec
    }
}

/// `chat_<timestamp>`, suffixed when an artifact of the same second already exists
async fn unique_chatlog_stem(chatlog_dir: &Path) -> String {
    let stem = format!("chat_{}", chrono::Local::now().format(CHATLOG_TIMESTAMP_FORMAT));
    let mut candidate = stem.clone();
    let mut suffix = 1;
    while tokio::fs::try_exists(chatlog_dir.join(format!("{}.yaml", candidate))).await.unwrap_or(false) {
        candidate = format!("{}_{}", stem, suffix);
        suffix += 1;
    }
    candidate
}

/// Moves the chatlogs into `output_dir` and writes the combined record, transcript and page.
/// Failures are logged, whatever could be assembled is kept.
pub async fn assemble_chatlogs(chatlogs: &[Chatlog], output_dir: &Path) {
    let mut records = Vec::new();
    let mut entries = Vec::new();
    let mut combined_log = String::new();

    for chatlog in chatlogs {
        for path in [&chatlog.record, &chatlog.transcript] {
            let Some(name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
                continue;
            };
            let content = match tokio::fs::read_to_string(path).await {
                Ok(content) => content,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Could not read chatlog");
                    continue;
                }
            };

            if path == &chatlog.record {
                match serde_yaml::from_str::<serde_yaml::Value>(&content) {
                    Ok(record) => {
                        records.push(record);
                        entries.push((name.clone(), content));
                    }
                    Err(e) => error!(path = %path.display(), error = %e, "Could not decode chatlog"),
                }
            } else {
                combined_log.push_str(&format!("\n\n----- {} -----\n\n\n", name));
                combined_log.push_str(&content);
            }

            if let Err(e) = move_file(path, &output_dir.join(&name)).await {
                error!(path = %path.display(), error = %e, "Could not move chatlog");
            }
        }
    }

    if !combined_log.is_empty() {
        write_artifact(&output_dir.join(COMBINED_CHATLOGS_LOG), combined_log).await;
    }

    if !records.is_empty() {
        match serde_yaml::to_string(&records) {
            Ok(yaml) => write_artifact(&output_dir.join(COMBINED_CHATLOGS_YAML), yaml).await,
            Err(e) => error!(error = %e, "Could not encode combined chatlogs"),
        }
        write_artifact(&output_dir.join(COMBINED_CHATLOGS_HTML), render_combined_chatlogs(&entries)).await;
    }
    debug!(chatlogs = chatlogs.len(), out_dir = %output_dir.display(), "Assembled precheck chatlogs");
}

async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

async fn write_artifact(path: &Path, content: String) {
    match tokio::fs::write(path, content).await {
        Ok(()) => debug!(path = %path.display(), "Wrote combined artifact"),
        Err(e) => warn!(path = %path.display(), error = %e, "Could not write combined artifact"),
    }
}
