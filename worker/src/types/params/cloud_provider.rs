use crate::cli::storage::aws_s3::AWSS3CliArgs;
use aws_config::{Region, SdkConfig};

#[derive(Debug, Clone)]
pub struct AWSCredentials {
    pub region: String,
}

impl AWSCredentials {
    pub async fn get_aws_config(&self) -> SdkConfig {
        aws_config::from_env().region(Region::new(self.region.clone())).load().await
    }
}

impl From<AWSS3CliArgs> for AWSCredentials {
    fn from(args: AWSS3CliArgs) -> Self {
        Self { region: args.aws_region }
    }
}
