use crate::core::client::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use crate::error::job::git::GitError;
use crate::types::params::GithubParams;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// Materializes the head commit of a pull request into a fresh directory.
///
/// Every attempt starts from an empty destination, and a failed attempt removes
/// whatever it cloned before the next one starts.
pub struct GitWorkspace<'a> {
    runner: &'a dyn CommandRunner,
    params: &'a GithubParams,
}

impl<'a> GitWorkspace<'a> {
    pub fn new(runner: &'a dyn CommandRunner, params: &'a GithubParams) -> Self {
        Self { runner, params }
    }

    /// Checks out `pr_number` into `dest` and returns the commit hash of its head.
    pub async fn checkout(&self, pr_number: u64, dest: &Path, cancel: &CancellationToken) -> Result<String, GitError> {
        let attempts = self.params.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.try_checkout(pr_number, dest, cancel).await {
                Ok(head) => {
                    info!(pr_number, head = %head, attempt, "Checked out pull request");
                    return Ok(head);
                }
                Err(e) => {
                    remove_checkout(dest).await?;
                    if e.is_cancelled() {
                        return Err(e);
                    }
                    if attempt >= attempts {
                        return Err(GitError::RetriesExhausted { attempts, source: Box::new(e) });
                    }
                    warn!(pr_number, attempt, error = %e, "Checkout attempt failed, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(self.params.retry_delay) => {}
                        _ = cancel.cancelled() => {
                            return Err(CommandError::Cancelled { command: "git checkout".to_string() }.into());
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn try_checkout(&self, pr_number: u64, dest: &Path, cancel: &CancellationToken) -> Result<String, GitError> {
        remove_checkout(dest).await?;

        let remote = authenticated_remote(self.params)?;
        let clone = CommandSpec::new("git")
            .arg("clone")
            .arg(remote.as_str())
            .arg(dest.to_string_lossy())
            .secret(self.params.token.as_str());
        self.git_step("clone", clone, cancel).await?;

        let branch = format!("pr-{}", pr_number);
        let fetch = CommandSpec::new("git")
            .args(["fetch".to_string(), self.params.origin.clone(), format!("pull/{}/head:{}", pr_number, branch)])
            .current_dir(dest)
            .secret(self.params.token.as_str());
        self.git_step("fetch", fetch, cancel).await?;

        let checkout = CommandSpec::new("git").args(["checkout", branch.as_str()]).current_dir(dest);
        self.git_step("checkout", checkout, cancel).await?;

        let rev_parse = CommandSpec::new("git").args(["rev-parse", "HEAD"]).current_dir(dest);
        let output = self.git_step("rev-parse", rev_parse, cancel).await?;
        let head = output.stdout.trim().to_string();
        if head.is_empty() {
            return Err(GitError::EmptyHead);
        }
        Ok(head)
    }

    async fn git_step(
        &self,
        step: &'static str,
        spec: CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, GitError> {
        debug!(command = %spec, "Running git {}", step);
        let output = self.runner.run(spec.clone(), cancel.clone()).await?;
        if !output.success() {
            return Err(GitError::StepFailed {
                step,
                status: output.status_display(),
                stderr: spec.redact(output.stderr.trim()),
            });
        }
        Ok(output)
    }
}

/// Clone address carrying the GitHub credentials as basic auth
pub fn authenticated_remote(params: &GithubParams) -> Result<Url, GitError> {
    let mut remote = params.remote.clone();
    remote
        .set_username(&params.username)
        .map_err(|_| GitError::InvalidRemote(params.remote.to_string()))?;
    remote
        .set_password(Some(&params.token))
        .map_err(|_| GitError::InvalidRemote(params.remote.to_string()))?;
    Ok(remote)
}

/// Removes a checkout directory. A missing directory is not an error.
pub async fn remove_checkout(path: &Path) -> Result<(), GitError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed checkout");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(GitError::Cleanup { path: path.display().to_string(), source }),
    }
}
