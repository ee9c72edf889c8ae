use crate::core::client::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs commands as child processes of the worker, inheriting its environment.
#[derive(Debug, Clone, Default)]
pub struct LocalCommandRunner;

#[async_trait]
impl CommandRunner for LocalCommandRunner {
    async fn run(&self, spec: CommandSpec, cancel: CancellationToken) -> Result<CommandOutput, CommandError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        debug!(command = %spec, "Spawning command");
        let child = command.spawn().map_err(|source| CommandError::Spawn { command: spec.to_string(), source })?;

        tokio::select! {
            output = child.wait_with_output() => {
                let output = output.map_err(|source| CommandError::Wait { command: spec.to_string(), source })?;
                let output = CommandOutput {
                    status: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: spec.redact(&String::from_utf8_lossy(&output.stderr)),
                };
                debug!(command = %spec, status = %output.status_display(), "Command finished");
                Ok(output)
            }
            _ = cancel.cancelled() => {
                warn!(command = %spec, "Cancelling command, child process will be killed");
                Err(CommandError::Cancelled { command: spec.to_string() })
            }
        }
    }
}
