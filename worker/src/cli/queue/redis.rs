use clap::Args;

/// Parameters used to connect to the shared Redis queue.
#[derive(Debug, Clone, Args)]
pub struct RedisCliArgs {
    /// The Redis address, either `host:port` or a `redis://` URL
    #[arg(env = "ILWORKER_REDIS", long = "redis", default_value = "localhost:6379")]
    pub redis_address: String,
}
