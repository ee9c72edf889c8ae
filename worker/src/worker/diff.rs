use crate::core::client::command::{CommandRunner, CommandSpec};
use crate::error::job::{JobError, JobResult};
use crate::types::constant::TAXONOMY_EXTENSION;
use crate::types::ilab_config::IlabConfig;
use crate::types::jobs::types::CommandAudit;
use crate::types::params::IlabParams;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Taxonomy files changed by the checked out pull request, relative to the taxonomy root.
///
/// Runs `ilab taxonomy diff` on the job checkout and keeps the lines naming a YAML file.
pub async fn changed_taxonomy_files(
    runner: &dyn CommandRunner,
    ilab: &IlabParams,
    ilab_config: &IlabConfig,
    taxonomy_dir: &Path,
    audit: &mut CommandAudit,
    cancel: &CancellationToken,
) -> JobResult<Vec<String>> {
    let spec = CommandSpec::new(ilab.lab_binary())
        .args(["taxonomy", "diff"])
        .args(ilab_config.taxonomy_args(taxonomy_dir))
        .current_dir(&ilab.work_dir);
    audit.record(spec.to_string());

    let output = runner.run(spec.clone(), cancel.clone()).await?;
    if !output.success() {
        return Err(JobError::CommandFailed {
            command: spec.to_string(),
            status: output.status_display(),
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }

    let files = parse_diff_output(&output.stdout);
    debug!(files = ?files, "Taxonomy diff");
    Ok(files)
}

fn parse_diff_output(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with(TAXONOMY_EXTENSION))
        .map(ToString::to_string)
        .collect()
}
