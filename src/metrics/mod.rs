//! Request metrics for the relay
//!
//! Completed exchanges arrive as [`RequestEvent`]s and are folded into a
//! single [`MetricsCollector`]. The console and the status page read
//! [`MetricsSnapshot`]s; [`ConnectionStats`] is recomputed from the latency
//! window on every snapshot.

mod collector;
pub mod event;
mod snapshot;
pub mod stats;
pub mod window;

pub use collector::MetricsCollector;
pub use event::{RequestEvent, status_text};
pub use snapshot::MetricsSnapshot;
pub use stats::ConnectionStats;
pub use window::{RequestLog, ResponseTimeWindow, Sample};
