pub mod controller;
pub mod diff;
pub mod model;
pub mod notifier;
pub mod precheck;
pub mod processor;
pub mod publisher;
pub mod render;
pub mod sdg;
pub mod workspace;

use crate::core::config::Config;
use crate::WorkerResult;
use controller::WorkerController;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Starts the dispatcher in the background and returns the controller used to stop it.
///
/// # Arguments
/// * `config` - The configuration shared by every job
/// * `shutdown_token` - Cancelled on shutdown. Each job runs under a child token.
pub async fn initialize_worker(config: Arc<Config>, shutdown_token: CancellationToken) -> WorkerResult<WorkerController> {
    info!("Initializing worker");

    let mut controller = WorkerController::new(config, shutdown_token);
    controller.start();

    info!("Worker initialized and started successfully");
    Ok(controller)
}
