//! Tokio runtime configuration and shared utilities for binary targets
//!
//! This module provides:
//! - Testable runtime configuration and builder logic
//! - Shutdown signal handling and fan-out
//! - Config loading shared by `tunnel-relay` and `tunnel-monitor`

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use crate::args::CommonArgs;
use crate::config::{Config, ConfigSource, load_config_with_fallback};
use crate::types::{Port, ThreadCount};

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads
    worker_threads: usize,
}

impl RuntimeConfig {
    /// Create runtime config from optional thread count
    ///
    /// If `threads` is None, defaults to 1 thread.
    /// Single-threaded runtime is used if threads == 1.
    #[must_use]
    pub fn from_args(threads: Option<ThreadCount>) -> Self {
        let worker_threads = threads.map_or(1, |t| t.get());
        Self { worker_threads }
    }

    /// Get number of worker threads
    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Check if single-threaded
    #[must_use]
    pub const fn is_single_threaded(&self) -> bool {
        self.worker_threads == 1
    }

    /// Build the tokio runtime
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = if self.is_single_threaded() {
            info!("Starting with single-threaded runtime");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            let num_cpus = std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1);
            info!(
                "Starting with {} worker threads (detected {} CPUs)",
                self.worker_threads, num_cpus
            );
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .enable_all()
                .build()?
        };
        Ok(rt)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_args(None)
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Sending half of the shutdown fan-out
///
/// Every long-running task holds a [`ShutdownListener`] subscribed from this.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// A new listener for one task
    #[must_use]
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Tell every listener to stop
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of the shutdown fan-out
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once shutdown has been triggered
    ///
    /// Also resolves if the [`Shutdown`] handle was dropped.
    pub async fn wait(&mut self) {
        // Err means the sender is gone, which is shutdown too
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Spawn the task that turns a process signal into a [`Shutdown`] trigger
pub fn spawn_signal_handler(shutdown: std::sync::Arc<Shutdown>) {
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        shutdown.trigger();
    });
}

/// Load the config file, apply command-line overrides, and validate
///
/// Common pattern across both binary targets. Runs before logging is set
/// up, so the caller logs the returned [`ConfigSource`].
///
/// # Errors
/// Returns error if the file exists but cannot be parsed, or if the merged
/// configuration is invalid
pub fn load_and_apply_config(
    args: &CommonArgs,
    default_console_port: Port,
    apply_extra: impl FnOnce(&mut Config),
) -> Result<(Config, ConfigSource)> {
    let (mut config, source) = load_config_with_fallback(&args.config)?;
    args.apply_to(&mut config, default_console_port);
    apply_extra(&mut config);
    config.validate()?;
    Ok((config, source))
}
