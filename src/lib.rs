//! # tunnel-relay
//!
//! Exposes a local HTTP service on a public port and shows what passes
//! through it: a 1 Hz terminal dashboard with latency percentiles and the
//! most recent requests, plus a small status page on a separate port.
//!
//! ## Layout
//!
//! - [`relay`]: public listener and request forwarding
//! - [`metrics`]: rolling request log, latency window and stats
//! - [`console`]: terminal dashboard and headless summary
//! - [`status`]: HTML and JSON status page
//! - [`config`] / [`args`]: layered configuration

pub mod args;
pub mod config;
pub mod console;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod network;
pub mod relay;
pub mod runtime;
pub mod session;
pub mod status;
pub mod types;

pub use config::{Config, ConfigSource, load_config, load_config_with_fallback};
pub use console::Dashboard;
pub use error::{ListenerRole, RelayError, UpstreamFailure};
pub use metrics::{ConnectionStats, MetricsCollector, MetricsSnapshot, RequestEvent};
pub use relay::RelayListener;
pub use runtime::{RuntimeConfig, Shutdown, ShutdownListener};
pub use session::TunnelSession;
pub use status::{StatusServer, StatusState};
