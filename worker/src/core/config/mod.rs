use crate::cli::GenerateCmd;
use crate::core::client::{
    command::CommandRunner, queue::QueueClient, storage::StorageClient, LocalCommandRunner, RedisQueue, AWSS3,
};
use crate::error::job::sdg::SdgError;
use crate::types::ilab_config::IlabConfig;
use crate::types::params::cloud_provider::AWSCredentials;
use crate::types::params::{
    GithubParams, IlabParams, PrecheckParams, QueueArgs, SdgParams, ServiceParams, StorageArgs, WorkerParams,
};
use crate::worker::sdg::SdgClient;
use crate::WorkerResult;
use aws_config::SdkConfig;
use tracing::info;

/// The worker config. Built once at startup and shared as `Arc<Config>` with every job.
pub struct Config {
    /// The validated command line parameters
    params: WorkerParams,
    /// The InstructLab configuration file
    ilab_config: IlabConfig,
    /// Queue client
    queue: Box<dyn QueueClient>,
    /// Storage client
    storage: Box<dyn StorageClient>,
    /// Runs git and ilab
    command_runner: Box<dyn CommandRunner>,
    /// Prebuilt SDG client. Built from the TLS files on demand when absent.
    sdg_client: Option<SdgClient>,
}

impl Config {
    pub fn new(
        params: WorkerParams,
        ilab_config: IlabConfig,
        queue: Box<dyn QueueClient>,
        storage: Box<dyn StorageClient>,
        command_runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self { params, ilab_config, queue, storage, command_runner, sdg_client: None }
    }

    /// Setup the worker. Every failure here is fatal for the process.
    pub async fn setup(generate_cmd: &GenerateCmd) -> WorkerResult<Self> {
        let params = WorkerParams::try_from(generate_cmd.clone())?;
        let ilab_config = IlabConfig::from_file(&params.ilab.ilab_config_file)?;
        info!(
            config_file = %params.ilab.ilab_config_file.display(),
            taxonomy_path = %ilab_config.generate.taxonomy_path.display(),
            logs_dir = %ilab_config.chat.logs_dir.display(),
            "InstructLab config loaded"
        );

        let aws_config = AWSCredentials::from(generate_cmd.aws_s3_args.clone()).get_aws_config().await;

        let queue = Self::build_queue_client(&params.queue).await?;
        queue.health_check().await?;
        let storage = Self::build_storage_client(&params.storage, &aws_config);
        storage.health_check().await?;
        info!(bucket = %params.storage.bucket_name, "Queue and storage are reachable");

        Ok(Self::new(params, ilab_config, queue, storage, Box::new(LocalCommandRunner)))
    }

    async fn build_queue_client(queue_args: &QueueArgs) -> WorkerResult<Box<dyn QueueClient>> {
        Ok(Box::new(RedisQueue::create(queue_args).await?))
    }

    fn build_storage_client(storage_args: &StorageArgs, aws_config: &SdkConfig) -> Box<dyn StorageClient> {
        Box::new(AWSS3::new(aws_config, storage_args))
    }

    pub fn with_sdg_client(mut self, sdg_client: SdgClient) -> Self {
        self.sdg_client = Some(sdg_client);
        self
    }

    pub fn ilab_params(&self) -> &IlabParams {
        &self.params.ilab
    }

    pub fn github_params(&self) -> &GithubParams {
        &self.params.github
    }

    pub fn storage_params(&self) -> &StorageArgs {
        &self.params.storage
    }

    pub fn precheck_params(&self) -> &PrecheckParams {
        &self.params.precheck
    }

    pub fn sdg_params(&self) -> &SdgParams {
        &self.params.sdg
    }

    pub fn service_params(&self) -> &ServiceParams {
        &self.params.service
    }

    pub fn ilab_config(&self) -> &IlabConfig {
        &self.ilab_config
    }

    /// Returns the queue provider
    pub fn queue(&self) -> &dyn QueueClient {
        self.queue.as_ref()
    }

    /// Returns the storage provider
    pub fn storage(&self) -> &dyn StorageClient {
        self.storage.as_ref()
    }

    pub fn command_runner(&self) -> &dyn CommandRunner {
        self.command_runner.as_ref()
    }

    /// The mutual TLS client for the SDG service. A missing or invalid certificate
    /// only fails the `sdg-svc` job asking for it.
    pub fn sdg_client(&self) -> Result<SdgClient, SdgError> {
        match &self.sdg_client {
            Some(client) => Ok(client.clone()),
            None => SdgClient::from_params(&self.params.sdg),
        }
    }
}
