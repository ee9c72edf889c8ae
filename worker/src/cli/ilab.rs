use clap::Args;
use std::path::PathBuf;

/// Parameters describing the local InstructLab installation.
#[derive(Debug, Clone, Args)]
pub struct IlabCliArgs {
    /// Directory to work in. Defaults to the current directory.
    #[arg(env = "ILWORKER_WORK_DIR", long, short = 'w')]
    pub work_dir: Option<PathBuf>,

    /// The virtual environment directory holding the `ilab` binary.
    #[arg(env = "ILWORKER_VENV_DIR", long, short = 'v')]
    pub venv_dir: Option<PathBuf>,

    /// InstructLab config file path - <path>/config.yaml
    #[arg(env = "ILWORKER_ILAB_CONFIG_FILE", long, default_value = "config.yaml")]
    pub ilab_config_file: PathBuf,

    /// The number of instructions to generate
    #[arg(env = "ILWORKER_NUM_INSTRUCTIONS", long, short = 'n', default_value_t = 10)]
    pub num_instructions: u32,
}
