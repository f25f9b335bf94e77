//! Count-bounded rolling buffers
//!
//! The request table and the latency window are bounded independently, both
//! by count. Neither evicts by age.

use std::collections::VecDeque;
use std::time::Instant;

use super::event::RequestEvent;
use crate::constants::metrics::{REQUEST_LOG_CAPACITY, RESPONSE_WINDOW_CAPACITY};

/// Most recent events, newest first
#[derive(Debug, Clone)]
pub struct RequestLog {
    entries: VecDeque<RequestEvent>,
    capacity: usize,
}

impl RequestLog {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(REQUEST_LOG_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Insert at the front, dropping the oldest entry past capacity
    pub fn push(&mut self, event: RequestEvent) {
        self.entries.push_front(event);
        self.entries.truncate(self.capacity);
    }

    /// Iterate newest first
    pub fn iter(&self) -> impl Iterator<Item = &RequestEvent> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A latency sample keyed by the instant it was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub at: Instant,
    pub duration_ms: u64,
}

/// Latency samples in arrival order, capped by count
#[derive(Debug, Clone)]
pub struct ResponseTimeWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl ResponseTimeWindow {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(RESPONSE_WINDOW_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample, evicting from the front past capacity
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl Default for ResponseTimeWindow {
    fn default() -> Self {
        Self::new()
    }
}
