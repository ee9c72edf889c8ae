use clap::Args;

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, Args)]
pub struct ServiceCliArgs {
    /// Skip all real work and report a placeholder result after a fixed delay.
    #[arg(env = "ILWORKER_TEST_MODE", long, default_value_t = false)]
    pub test_mode: bool,

    /// The maximum number of jobs processed concurrently. 1 keeps processing serial.
    #[arg(env = "ILWORKER_MAX_CONCURRENT_JOBS", long, default_value = "1", value_parser = parse_positive_usize)]
    pub max_concurrent_jobs: usize,

    /// Interval between two pops of the work queue, in milliseconds.
    #[arg(env = "ILWORKER_POLL_INTERVAL_MS", long, default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Time allowed for in-flight jobs to finish after a shutdown signal, in seconds.
    #[arg(env = "ILWORKER_SHUTDOWN_TIMEOUT_SECONDS", long, default_value = "120")]
    pub shutdown_timeout_seconds: u64,
}
