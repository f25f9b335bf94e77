//! Windowed latency statistics
//!
//! Everything here is a pure function of the sample window and `now`.
//! Latencies are reported in seconds rounded to two decimals.

use serde::Serialize;
use std::time::Instant;

use super::window::ResponseTimeWindow;
use crate::constants::metrics::{WINDOW_1M, WINDOW_5M};

/// The stats row shown on the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConnectionStats {
    /// Events recorded since start (never reset)
    pub total: u64,
    /// Exchanges started but not yet finished
    pub active: u64,
    /// Samples recorded within the last minute
    pub requests_1m: usize,
    /// Mean latency over the last minute, seconds
    pub rt1: f64,
    /// Mean latency over the last five minutes, seconds
    pub rt5: f64,
    /// Nearest-rank median over the last minute, seconds
    pub p50: f64,
    /// Nearest-rank 90th percentile over the last minute, seconds
    pub p90: f64,
}

impl ConnectionStats {
    /// Compute the stats row from the latency window at `now`
    ///
    /// A sample belongs to a window when it was recorded strictly less than
    /// the window length before `now`.
    #[must_use]
    pub fn compute(window: &ResponseTimeWindow, now: Instant, total: u64, active: u64) -> Self {
        let mut last_minute: Vec<u64> = Vec::new();
        let mut last_five = Vec::new();

        for sample in window.iter() {
            let age = now.saturating_duration_since(sample.at);
            if age < WINDOW_5M {
                last_five.push(sample.duration_ms);
                if age < WINDOW_1M {
                    last_minute.push(sample.duration_ms);
                }
            }
        }

        let rt1 = mean_secs(&last_minute);
        let rt5 = mean_secs(&last_five);

        last_minute.sort_unstable();
        let p50 = nearest_rank(&last_minute, 0.5).map_or(0.0, ms_to_secs);
        let p90 = nearest_rank(&last_minute, 0.9).map_or(0.0, ms_to_secs);

        Self {
            total,
            active,
            requests_1m: last_minute.len(),
            rt1,
            rt5,
            p50,
            p90,
        }
    }
}

/// Nearest-rank percentile over an ascending slice: `sorted[floor(q * len)]`
///
/// Returns `None` for an empty slice. The index is clamped so `q = 1.0`
/// yields the maximum.
#[must_use]
pub fn nearest_rank(sorted: &[u64], q: f64) -> Option<u64> {
    let last = sorted.len().checked_sub(1)?;
    let index = (q * sorted.len() as f64).floor() as usize;
    sorted.get(index.min(last)).copied()
}

/// Round to two decimal places
#[must_use]
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[inline]
fn ms_to_secs(ms: u64) -> f64 {
    round2(ms as f64 / 1000.0)
}

fn mean_secs(durations: &[u64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let sum: u128 = durations.iter().map(|&d| u128::from(d)).sum();
    round2(sum as f64 / durations.len() as f64 / 1000.0)
}
