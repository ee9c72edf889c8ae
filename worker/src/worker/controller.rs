use crate::core::config::Config;
use crate::types::queue::QueueType;
use crate::worker::processor::JobProcessor;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pops job tokens on a fixed tick and runs them on a bounded pool.
///
/// A token is popped only while a pool permit is held, so every popped token is
/// handed to exactly one job task and never waits in the worker.
pub struct Dispatcher {
    config: Arc<Config>,
    shutdown_token: CancellationToken,
    permits: Arc<Semaphore>,
    jobs: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, shutdown_token: CancellationToken) -> Self {
        let permits = Arc::new(Semaphore::new(config.service_params().max_concurrent_jobs.max(1)));
        Self { config, shutdown_token, permits, jobs: JoinSet::new() }
    }

    /// Runs until the shutdown token is cancelled, then waits for the running jobs.
    pub async fn run(mut self) {
        let service = self.config.service_params();
        info!(
            poll_interval_ms = service.poll_interval.as_millis() as u64,
            max_concurrent_jobs = service.max_concurrent_jobs,
            test_mode = service.test_mode,
            "Starting dispatcher"
        );

        let mut interval = tokio::time::interval(service.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = interval.tick() => {}
            }
            self.reap_finished();
            self.poll_once().await;
        }

        info!(in_flight = self.jobs.len(), "Dispatcher stopped polling, waiting for running jobs");
        while let Some(result) = self.jobs.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Job task panicked");
            }
        }
        info!("Dispatcher stopped");
    }

    /// Pops tokens while pool permits are free and the queue is not empty.
    /// Returns the number of jobs started.
    pub async fn poll_once(&mut self) -> usize {
        let mut started = 0;
        while !self.shutdown_token.is_cancelled() {
            let Ok(permit) = self.permits.clone().try_acquire_owned() else {
                debug!("Every worker slot is busy");
                break;
            };

            match self.config.queue().pop_job(QueueType::Generate).await {
                Ok(Some(token)) => {
                    info!(job = %token, "Popped job");
                    let processor =
                        JobProcessor::new(self.config.clone(), token, self.shutdown_token.child_token());
                    self.jobs.spawn(async move {
                        processor.process().await;
                        drop(permit);
                    });
                    started += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Could not pop from the job queue");
                    break;
                }
            }
        }
        started
    }

    /// Number of jobs still running
    pub fn in_flight(&self) -> usize {
        self.jobs.len()
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.jobs.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "Job task panicked");
            }
        }
    }
}

/// Owns the dispatcher task for shutdown management
pub struct WorkerController {
    config: Arc<Config>,
    shutdown_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl WorkerController {
    pub fn new(config: Arc<Config>, shutdown_token: CancellationToken) -> Self {
        Self { config, shutdown_token, handle: None }
    }

    /// Spawns the dispatcher in the background
    pub fn start(&mut self) {
        let dispatcher = Dispatcher::new(self.config.clone(), self.shutdown_token.clone());
        self.handle = Some(tokio::spawn(dispatcher.run()));
    }

    /// Stops popping, cancels the running jobs and waits for them to report
    pub async fn shutdown(&mut self) {
        info!("Initiating graceful shutdown of the dispatcher");
        self.shutdown_token.cancel();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Dispatcher task panicked");
            }
        }
        info!("Worker controller shutdown complete");
    }
}
