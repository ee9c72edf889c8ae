use clap::Parser as _;
use dotenvy::dotenv;
use ilab_worker::cli::{Cli, Commands, GenerateCmd};
use ilab_worker::core::config::Config;
use ilab_worker::utils::logging::init_logging;
use ilab_worker::utils::signal_handler::SignalHandler;
use ilab_worker::worker::initialize_worker;
use ilab_worker::WorkerResult;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Start the worker
#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();
    info!("Starting ilab worker");
    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { generate_command } => {
            info!("Executing generate command");
            match run_worker(generate_command).await {
                Ok(_) => {
                    info!("Worker stopped cleanly");
                }
                Err(e) => {
                    error!(
                        error = %e,
                        error_chain = ?e,
                        "Failed to run worker"
                    );
                    panic!("Failed to run worker: {}", e);
                }
            }
        }
    }
}

async fn run_worker(generate_cmd: &GenerateCmd) -> WorkerResult<()> {
    let config = Arc::new(Config::setup(generate_cmd).await?);
    debug!("Configuration initialized");

    let shutdown_token = CancellationToken::new();
    let mut controller = initialize_worker(config.clone(), shutdown_token.clone()).await?;

    let mut signal_handler = SignalHandler::new();
    signal_handler.wait_for_shutdown().await?;

    let timeout_secs = config.service_params().shutdown_timeout_secs;
    signal_handler
        .handle_graceful_shutdown(
            || async move {
                controller.shutdown().await;
                Ok(())
            },
            timeout_secs,
        )
        .await?;

    info!("Worker shutting down");
    Ok(())
}
