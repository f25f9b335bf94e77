//! Local status page
//!
//! Any path returns a small auto-refreshing HTML summary; `/api/stats`
//! returns the same data as JSON. Every hit is itself recorded as a
//! locally served request event.

mod page;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router};
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{Html, Response};
use axum::routing::get;
use chrono::SecondsFormat;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{ListenerRole, RelayError};
use crate::metrics::{ConnectionStats, MetricsCollector, RequestEvent};
use crate::network::join_host_port;
use crate::runtime::ShutdownListener;
use crate::session::TunnelSession;
use crate::types::Port;

/// Shared state of the status page handlers
#[derive(Debug, Clone)]
pub struct StatusState {
    pub session: Arc<TunnelSession>,
    pub metrics: MetricsCollector,
}

/// JSON body of `/api/stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub public_url: String,
    pub forwarding: String,
    pub console_url: String,
    pub uptime_secs: u64,
    pub stats: ConnectionStats,
    pub recent: Vec<RecentRequest>,
}

/// One request table row in `/api/stats`
#[derive(Debug, Serialize)]
pub struct RecentRequest {
    pub time: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub status_text: &'static str,
    pub duration_ms: u64,
    pub forwarded: bool,
}

impl From<&RequestEvent> for RecentRequest {
    fn from(event: &RequestEvent) -> Self {
        Self {
            time: event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
            method: event.method.clone(),
            path: event.path.clone(),
            status: event.status_code,
            status_text: event.status_text,
            duration_ms: event.duration_ms,
            forwarded: event.forwarded,
        }
    }
}

/// Build the status page router
pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/api/stats", get(api_stats))
        .fallback(status_page)
        .layer(middleware::from_fn_with_state(state.clone(), record_hit))
        .with_state(state)
}

async fn status_page(State(state): State<StatusState>) -> Html<String> {
    let now = Instant::now();
    let total = state.metrics.total();
    Html(page::render_html(&state.session, total, now))
}

async fn api_stats(State(state): State<StatusState>) -> Json<StatsResponse> {
    let now = Instant::now();
    let snapshot = state.metrics.snapshot(now);
    Json(StatsResponse {
        public_url: state.session.public_url(),
        forwarding: state.session.forwarding(),
        console_url: state.session.console_url(),
        uptime_secs: state.session.uptime(now).as_secs(),
        stats: snapshot.stats,
        recent: snapshot.recent.iter().map(RecentRequest::from).collect(),
    })
}

/// Record every status page hit with `forwarded = false`
async fn record_hit(State(state): State<StatusState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string());

    let response = next.run(req).await;

    state.metrics.record_event(RequestEvent::new(
        method,
        path,
        response.status().as_u16(),
        started.elapsed(),
        false,
    ));
    response
}

/// Bound status page listener
pub struct StatusServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: StatusState,
}

impl StatusServer {
    /// Bind `host:port`
    ///
    /// # Errors
    /// [`RelayError::Bind`] if the port is unavailable
    pub async fn bind(host: &str, port: Port, state: StatusState) -> Result<Self, RelayError> {
        Self::bind_to(&join_host_port(host, port), state).await
    }

    /// Bind an explicit address (port 0 picks an ephemeral port)
    ///
    /// # Errors
    /// [`RelayError::Bind`] if the address is unavailable
    pub async fn bind_to(addr: &str, state: StatusState) -> Result<Self, RelayError> {
        let bind_error = |source| RelayError::Bind {
            role: ListenerRole::Status,
            addr: addr.to_string(),
            source,
        };

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        info!("Status page listening on http://{}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            state,
        })
    }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until shutdown
    ///
    /// # Errors
    /// [`RelayError::Serve`] if the listener fails
    pub async fn run(self, mut shutdown: ShutdownListener) -> Result<(), RelayError> {
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .map_err(|source| RelayError::Serve {
                role: ListenerRole::Status,
                source,
            })
    }
}
