pub mod cloud_provider;

use crate::cli::GenerateCmd;
use crate::types::constant::{
    GIT_MAX_ATTEMPTS, GIT_RETRY_DELAY, LOCAL_ENDPOINT, PRECHECK_EXAMPLE_SPACING, TEST_MODE_DELAY,
};
use crate::WorkerError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// IlabParams - Location of the InstructLab installation and working directory
#[derive(Debug, Clone)]
pub struct IlabParams {
    pub work_dir: PathBuf,
    pub venv_dir: Option<PathBuf>,
    pub ilab_config_file: PathBuf,
    pub num_instructions: u32,
}

impl IlabParams {
    /// The `ilab` binary, taken from the virtual environment when one is configured
    pub fn lab_binary(&self) -> PathBuf {
        match &self.venv_dir {
            Some(venv) => venv.join("bin").join("ilab"),
            None => PathBuf::from("ilab"),
        }
    }

    /// Private directory of one job: its taxonomy checkout, chatlogs and output directory
    pub fn job_dir(&self, token: &str) -> PathBuf {
        let token: String =
            token.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect();
        self.work_dir.join(format!("job-{}", token))
    }
}

/// GithubParams - Arguments used to check out pull requests
#[derive(Debug, Clone)]
pub struct GithubParams {
    pub remote: Url,
    pub origin: String,
    pub username: String,
    pub token: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

/// QueueArgs - Arguments used to connect to the Redis queue
#[derive(Debug, Clone)]
pub struct QueueArgs {
    pub redis_url: String,
}

/// StorageArgs - Arguments used to publish artifacts
#[derive(Debug, Clone)]
pub struct StorageArgs {
    pub bucket_name: String,
    pub region: String,
}

impl StorageArgs {
    /// Public address of an object uploaded under `key`
    pub fn public_url(&self, key: &str) -> String {
        format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket_name, self.region, key)
    }
}

#[derive(Debug, Clone)]
pub struct PrecheckParams {
    pub endpoint_url: String,
    pub api_key: Option<String>,
    pub tls_insecure: bool,
    pub example_spacing: Duration,
}

impl PrecheckParams {
    /// Whether precheck talks to a model served somewhere else than the worker node
    pub fn is_remote(&self) -> bool {
        self.endpoint_url.trim_end_matches('/') != LOCAL_ENDPOINT
    }
}

#[derive(Debug, Clone)]
pub struct SdgParams {
    pub endpoint_url: Url,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub server_ca_cert: PathBuf,
    pub tls_insecure: bool,
    pub max_seed: usize,
    pub num_samples: u32,
}

#[derive(Debug, Clone)]
pub struct ServiceParams {
    pub test_mode: bool,
    pub test_mode_delay: Duration,
    pub max_concurrent_jobs: usize,
    pub poll_interval: Duration,
    pub shutdown_timeout_secs: u64,
}

/// All the validated parameters of a worker process
#[derive(Debug, Clone)]
pub struct WorkerParams {
    pub ilab: IlabParams,
    pub github: GithubParams,
    pub queue: QueueArgs,
    pub storage: StorageArgs,
    pub precheck: PrecheckParams,
    pub sdg: SdgParams,
    pub service: ServiceParams,
}

/// NOTE: The command line arguments are validated once here and never read again.
impl TryFrom<GenerateCmd> for WorkerParams {
    type Error = WorkerError;

    fn try_from(cmd: GenerateCmd) -> Result<Self, Self::Error> {
        let work_dir = match cmd.ilab_args.work_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        if cmd.github_args.github_token.trim().is_empty() {
            return Err(WorkerError::ConfigError("a GitHub token is required".to_string()));
        }
        let remote = Url::parse(&cmd.github_args.git_remote)
            .map_err(|e| WorkerError::ConfigError(format!("invalid git remote {}: {}", cmd.github_args.git_remote, e)))?;

        let redis_url = if cmd.redis_args.redis_address.contains("://") {
            cmd.redis_args.redis_address
        } else {
            format!("redis://{}", cmd.redis_args.redis_address)
        };

        Ok(Self {
            ilab: IlabParams {
                work_dir,
                venv_dir: cmd.ilab_args.venv_dir,
                ilab_config_file: cmd.ilab_args.ilab_config_file,
                num_instructions: cmd.ilab_args.num_instructions,
            },
            github: GithubParams {
                remote,
                origin: cmd.github_args.origin,
                username: cmd.github_args.github_username,
                token: cmd.github_args.github_token,
                max_attempts: GIT_MAX_ATTEMPTS,
                retry_delay: GIT_RETRY_DELAY,
            },
            queue: QueueArgs { redis_url },
            storage: StorageArgs { bucket_name: cmd.aws_s3_args.s3_bucket, region: cmd.aws_s3_args.aws_region },
            precheck: PrecheckParams {
                endpoint_url: cmd.precheck_args.precheck_endpoint_url,
                api_key: cmd.precheck_args.precheck_api_key.filter(|key| !key.is_empty()),
                tls_insecure: cmd.sdg_args.tls_insecure,
                example_spacing: PRECHECK_EXAMPLE_SPACING,
            },
            sdg: SdgParams {
                endpoint_url: cmd.sdg_args.sdg_endpoint_url,
                client_cert: cmd.sdg_args.tls_client_cert,
                client_key: cmd.sdg_args.tls_client_key,
                server_ca_cert: cmd.sdg_args.tls_server_ca_cert,
                tls_insecure: cmd.sdg_args.tls_insecure,
                max_seed: cmd.sdg_args.max_seed,
                num_samples: cmd.ilab_args.num_instructions,
            },
            service: ServiceParams {
                test_mode: cmd.service_args.test_mode,
                test_mode_delay: TEST_MODE_DELAY,
                max_concurrent_jobs: cmd.service_args.max_concurrent_jobs,
                poll_interval: Duration::from_millis(cmd.service_args.poll_interval_ms),
                shutdown_timeout_secs: cmd.service_args.shutdown_timeout_seconds,
            },
        })
    }
}
