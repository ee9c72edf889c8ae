use clap::{Parser, Subcommand};

pub mod github;
pub mod ilab;
pub mod precheck;
pub mod queue;
pub mod sdg;
pub mod service;
pub mod storage;

#[derive(Parser, Debug)]
#[command(
    name = "ilab-worker",
    about = "InstructLab worker - processes taxonomy pull request jobs",
    long_about = "The worker pops job tokens from the shared Redis queue, checks out the pull request, \
    runs local generation, precheck or the remote SDG service, publishes the artifacts to S3 and \
    reports the outcome on the results queue.",
    after_help = "Examples:\n  \
    ilab-worker generate --github-token <token> --redis localhost:6379\n  \
    ilab-worker generate --github-token <token> --precheck-endpoint-url https://model.example.com/v1"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Listen for jobs on the 'generate' queue and process them
    Generate {
        #[command(flatten)]
        generate_command: Box<GenerateCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateCmd {
    #[clap(flatten, next_help_heading = None)]
    pub ilab_args: ilab::IlabCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub github_args: github::GithubCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub redis_args: queue::redis::RedisCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub aws_s3_args: storage::aws_s3::AWSS3CliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub precheck_args: precheck::PrecheckCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub sdg_args: sdg::SdgCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub service_args: service::ServiceCliArgs,
}
