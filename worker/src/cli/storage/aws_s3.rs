use clap::Args;

/// Parameters used to config AWS S3.
#[derive(Debug, Clone, Args)]
pub struct AWSS3CliArgs {
    /// The S3 bucket the job artifacts are published to
    #[arg(env = "ILWORKER_S3_BUCKET", long, short = 'b', default_value = "instruct-lab-bot")]
    pub s3_bucket: String,

    /// The AWS region of the S3 bucket
    #[arg(env = "ILWORKER_AWS_REGION", long, short = 'a', default_value = "us-east-2")]
    pub aws_region: String,
}
