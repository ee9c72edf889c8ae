pub mod error;
pub mod local;

use async_trait::async_trait;
pub use error::CommandError;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const REDACTED: &str = "****";

/// An external command to run, with the values that must never be printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    secrets: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self { program: program.as_ref().to_string_lossy().into_owned(), ..Default::default() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Marks a value (token, API key) to be masked wherever the command is displayed
    pub fn secret(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.secrets.push(value);
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Masks the secrets of this command in `text`, e.g. its stderr
    pub fn redact(&self, text: &str) -> String {
        self.secrets.iter().fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), REDACTED))
    }

    /// Argument list with the secrets masked
    pub fn display_args(&self) -> String {
        self.redact(&self.args.join(" "))
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.display_args())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn status_display(&self) -> String {
        match self.status {
            Some(code) => code.to_string(),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Trait defining how external commands (git, ilab) are executed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion, capturing its output.
    ///
    /// A non-zero exit is not an error here; callers inspect [`CommandOutput::status`].
    /// Cancelling the token kills the child process.
    async fn run(&self, spec: CommandSpec, cancel: CancellationToken) -> Result<CommandOutput, CommandError>;
}
