//! Point-in-time view of the aggregate state
//!
//! Taken under the collector lock in one step, so a render never sees a
//! half-recorded event.

use super::event::RequestEvent;
use super::stats::ConnectionStats;

/// Immutable copy of everything the console and status page display
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub stats: ConnectionStats,
    /// Most recent events, newest first
    pub recent: Vec<RequestEvent>,
}

