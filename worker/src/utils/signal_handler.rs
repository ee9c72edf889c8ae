use anyhow::{anyhow, Context as _, Result};
use tracing::{error, info, warn};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Signal types that can trigger shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM, sent by the container runtime
    Terminate,
    /// SIGINT, Ctrl+C
    Interrupt,
    /// SIGQUIT
    Quit,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Quit => write!(f, "SIGQUIT"),
        }
    }
}

/// Waits for a termination signal and bounds the time spent shutting down
pub struct SignalHandler {
    shutdown_signal: Option<ShutdownSignal>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self { shutdown_signal: None }
    }

    /// Wait for any shutdown signal and return which one was received
    pub async fn wait_for_shutdown(&mut self) -> Result<ShutdownSignal> {
        let signal = self.wait_for_signal().await?;
        self.shutdown_signal = Some(signal);
        info!(signal = %signal, "Received shutdown signal");
        Ok(signal)
    }

    /// The signal that triggered shutdown, if any
    pub fn shutdown_signal(&self) -> Option<ShutdownSignal> {
        self.shutdown_signal
    }

    #[cfg(unix)]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sigquit = signal(SignalKind::quit()).context("Failed to create SIGQUIT handler")?;

        info!("Signal handler initialized, listening for SIGTERM, SIGINT and SIGQUIT");

        let signal = tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = sigquit.recv() => {
                warn!("Force quit signal received (SIGQUIT)");
                ShutdownSignal::Quit
            }
        };
        Ok(signal)
    }

    #[cfg(not(unix))]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        info!("Signal handler initialized, listening for Ctrl+C");

        tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;
        Ok(ShutdownSignal::Interrupt)
    }

    /// Runs `shutdown_fn` with a timeout. SIGQUIT exits the process immediately on timeout.
    pub async fn handle_graceful_shutdown<F, Fut>(&self, shutdown_fn: F, timeout_secs: u64) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let signal = self.shutdown_signal.unwrap_or(ShutdownSignal::Interrupt);

        info!(signal = %signal, timeout_secs, "Starting graceful shutdown");

        let timeout_duration = tokio::time::Duration::from_secs(timeout_secs);
        match tokio::time::timeout(timeout_duration, shutdown_fn()).await {
            Ok(Ok(())) => {
                info!("Graceful shutdown completed");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Graceful shutdown failed");
                Err(e)
            }
            Err(_) => {
                error!("Graceful shutdown timed out after {} seconds", timeout_secs);
                match signal {
                    ShutdownSignal::Quit => {
                        warn!("SIGQUIT received, forcing immediate exit");
                        std::process::exit(1);
                    }
                    _ => Err(anyhow!("Shutdown timeout exceeded, in-flight jobs may be incomplete")),
                }
            }
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}
