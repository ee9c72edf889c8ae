use clap::Args;

/// Parameters used to check out taxonomy pull requests.
#[derive(Debug, Clone, Args)]
pub struct GithubCliArgs {
    /// The git remote for the taxonomy repo
    #[arg(env = "ILWORKER_GIT_REMOTE", long, default_value = "https://github.com/instructlab/taxonomy")]
    pub git_remote: String,

    /// The origin to fetch from
    #[arg(env = "ILWORKER_ORIGIN", long, short = 'o', default_value = "origin")]
    pub origin: String,

    /// The GitHub username to use for authentication
    #[arg(env = "ILWORKER_GITHUB_USERNAME", long, short = 'u', default_value = "instructlab-bot")]
    pub github_username: String,

    /// The GitHub token to use for authentication
    #[arg(env = "ILWORKER_GITHUB_TOKEN", long, short = 'g', hide_env_values = true)]
    pub github_token: String,
}
