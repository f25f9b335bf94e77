//! Public relay listener
//!
//! Accepts plain HTTP/1 connections on the public port and serves each one
//! in its own task. Every request on a connection goes through
//! [`Forwarder::forward`] to the upstream.

mod exchange;
mod service;

pub use exchange::{ExchangeGuard, ExchangeState, TrackedBody};
pub use service::{Forwarder, RelayBody, RelayResponse};

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{RelayConfig, UpstreamTarget};
use crate::error::{ListenerRole, RelayError};
use crate::metrics::MetricsCollector;
use crate::network::SocketOptimizer;
use crate::runtime::ShutdownListener;

/// Bound public listener, ready to accept
pub struct RelayListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    forwarder: Arc<Forwarder>,
    shutdown_grace: Duration,
}

impl RelayListener {
    /// Bind the public port from the relay config
    ///
    /// # Errors
    /// [`RelayError::Bind`] if the port is taken or needs privileges; this
    /// is fatal for the process.
    pub async fn bind(config: &RelayConfig, metrics: MetricsCollector) -> Result<Self, RelayError> {
        Self::bind_to(
            &config.listen_addr(),
            config.upstream(),
            config.shutdown_grace,
            metrics,
        )
        .await
    }

    /// Bind an explicit `host:port` (port 0 picks an ephemeral port)
    ///
    /// # Errors
    /// [`RelayError::Bind`] on failure
    pub async fn bind_to(
        addr: &str,
        upstream: UpstreamTarget,
        shutdown_grace: Duration,
        metrics: MetricsCollector,
    ) -> Result<Self, RelayError> {
        let bind_error = |source| RelayError::Bind {
            role: ListenerRole::Relay,
            addr: addr.to_string(),
            source,
        };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        info!("Relay listening on {} -> {}", local_addr, upstream);

        Ok(Self {
            listener,
            local_addr,
            forwarder: Arc::new(Forwarder::new(upstream, metrics)),
            shutdown_grace,
        })
    }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until shutdown, then drain
    ///
    /// In-flight exchanges get the configured grace period to finish; any
    /// connection still open after that is aborted.
    pub async fn run(self, mut shutdown: ShutdownListener) {
        let http = http1::Builder::new();
        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                () = shutdown.wait() => {
                    info!("Shutdown initiated, stopping relay accept loop");
                    break;
                }

                Some(_) = connections.join_next(), if !connections.is_empty() => {}

                accept_result = self.listener.accept() => {
                    let (stream, peer) = match accept_result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!("Failed to accept relay connection: {}", e);
                            continue;
                        }
                    };
                    SocketOptimizer::apply(&stream);
                    debug!(peer = %peer, "Relay connection accepted");

                    let forwarder = Arc::clone(&self.forwarder);
                    let service = service_fn(move |req| {
                        let forwarder = Arc::clone(&forwarder);
                        async move { Ok::<_, Infallible>(forwarder.forward(req).await) }
                    });

                    let conn = graceful.watch(http.serve_connection(TokioIo::new(stream), service));
                    connections.spawn(async move {
                        if let Err(e) = conn.await {
                            debug!(peer = %peer, "Relay connection ended: {}", e);
                        }
                    });
                }
            }
        }

        drop(self.listener);
        drain(graceful, connections, self.shutdown_grace).await;
    }
}

async fn drain(graceful: GracefulShutdown, mut connections: JoinSet<()>, grace: Duration) {
    tokio::select! {
        () = graceful.shutdown() => {
            info!("All relay connections closed");
        }
        () = tokio::time::sleep(grace) => {
            warn!(
                "Grace period of {:?} elapsed, dropping {} relay connection(s)",
                grace,
                connections.len()
            );
        }
    }
    connections.shutdown().await;
}
