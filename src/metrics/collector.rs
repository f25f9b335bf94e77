//! Shared aggregate state
//!
//! Counters, the request table and the latency window live in one struct
//! behind one mutex. Every mutation and every snapshot takes that lock once,
//! which makes each recorded event atomic with respect to the others and to
//! the renderer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::event::RequestEvent;
use super::snapshot::MetricsSnapshot;
use super::stats::ConnectionStats;
use super::window::{RequestLog, ResponseTimeWindow, Sample};

/// Thread-safe handle to the aggregate state
///
/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

#[derive(Debug, Default)]
struct MetricsState {
    total: u64,
    active: u64,
    log: RequestLog,
    window: ResponseTimeWindow,
}

impl MetricsState {
    fn record(&mut self, event: RequestEvent, at: Instant) {
        self.window.push(Sample {
            at,
            duration_ms: event.duration_ms,
        });
        self.log.push(event);
        self.total += 1;
    }
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the state, recovering it if a previous holder panicked
    ///
    /// No method leaves the state half-updated across a panic point, so the
    /// data behind a poisoned lock is still consistent.
    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// An exchange entered the relay
    #[inline]
    pub fn request_started(&self) {
        self.state().active += 1;
    }

    /// An exchange reached a terminal state
    ///
    /// Decrements `active` and records the event in one critical section.
    /// `active` saturates at zero.
    pub fn request_finished(&self, event: RequestEvent) {
        let now = Instant::now();
        let mut state = self.state();
        state.active = state.active.saturating_sub(1);
        state.record(event, now);
    }

    /// Record an event that was never counted as active (status page hits)
    pub fn record_event(&self, event: RequestEvent) {
        self.record_event_at(event, Instant::now());
    }

    /// Record an event whose latency sample is stamped at `at`
    pub fn record_event_at(&self, event: RequestEvent, at: Instant) {
        self.state().record(event, at);
    }

    /// Events recorded since start
    #[must_use]
    pub fn total(&self) -> u64 {
        self.state().total
    }

    /// Exchanges currently in flight
    #[must_use]
    pub fn active(&self) -> u64 {
        self.state().active
    }

    /// Consistent view of counters, stats and the request table at `now`
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> MetricsSnapshot {
        let state = self.state();
        MetricsSnapshot {
            stats: ConnectionStats::compute(&state.window, now, state.total, state.active),
            recent: state.log.iter().cloned().collect(),
        }
    }

    /// Number of samples currently held in the latency window
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.state().window.len()
    }
}
