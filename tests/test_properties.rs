//! Property-based tests using proptest
//!
//! These tests verify invariants of the metrics engine and the console
//! formatting helpers over arbitrary inputs.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use tunnel_relay::console::{clip, format_uptime};
use tunnel_relay::constants::metrics::{REQUEST_LOG_CAPACITY, RESPONSE_WINDOW_CAPACITY};
use tunnel_relay::metrics::stats::nearest_rank;
use tunnel_relay::metrics::{ResponseTimeWindow, Sample, status_text};
use tunnel_relay::types::Port;
use tunnel_relay::{ConnectionStats, MetricsCollector, RequestEvent};

fn window_at(now: Instant, durations: &[u64]) -> ResponseTimeWindow {
    let mut window = ResponseTimeWindow::new();
    for &duration_ms in durations {
        window.push(Sample { at: now, duration_ms });
    }
    window
}

// =============================================================================
// 1. Bounded collections
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_lengths_are_bounded(n in 0usize..1500) {
        let metrics = MetricsCollector::new();
        for i in 0..n {
            metrics.record_event(RequestEvent::new("GET", format!("/{i}"), 200, Duration::from_millis(1), true));
        }
        let snapshot = metrics.snapshot(Instant::now());
        prop_assert_eq!(snapshot.stats.total, n as u64);
        prop_assert_eq!(snapshot.recent.len(), n.min(REQUEST_LOG_CAPACITY));
        prop_assert_eq!(metrics.window_len(), n.min(RESPONSE_WINDOW_CAPACITY));
    }

    #[test]
    fn prop_active_matches_unfinished(starts in 0u64..50, finishes in 0u64..80) {
        let metrics = MetricsCollector::new();
        for _ in 0..starts {
            metrics.request_started();
        }
        for _ in 0..finishes {
            metrics.request_finished(RequestEvent::new("GET", "/", 200, Duration::ZERO, true));
        }
        prop_assert_eq!(metrics.active(), starts.saturating_sub(finishes));
        prop_assert_eq!(metrics.total(), finishes);
    }
}

// =============================================================================
// 2. Windowed statistics
// =============================================================================

proptest! {
    #[test]
    fn prop_nearest_rank_is_a_member(mut values in prop::collection::vec(0u64..100_000, 1..200), q in 0.0f64..=1.0) {
        values.sort_unstable();
        let picked = nearest_rank(&values, q).unwrap();
        prop_assert!(values.contains(&picked));
        prop_assert!(picked >= values[0]);
        prop_assert!(picked <= values[values.len() - 1]);
    }

    #[test]
    fn prop_percentiles_ordered(values in prop::collection::vec(0u64..60_000, 1..300)) {
        let now = Instant::now();
        let stats = ConnectionStats::compute(&window_at(now, &values), now, 0, 0);
        let max = *values.iter().max().unwrap() as f64 / 1000.0;
        let min = *values.iter().min().unwrap() as f64 / 1000.0;

        prop_assert!(stats.p50 <= stats.p90);
        prop_assert!(stats.p90 <= max + 0.005);
        prop_assert!(stats.p50 >= min - 0.005);
        prop_assert!(stats.rt1 >= min - 0.005 && stats.rt1 <= max + 0.005);
        prop_assert_eq!(stats.rt1, stats.rt5);
        prop_assert_eq!(stats.requests_1m, values.len());
    }

    #[test]
    fn prop_stats_ignore_arrival_order(values in prop::collection::vec(0u64..10_000, 0..100)) {
        let now = Instant::now();
        let mut reversed = values.clone();
        reversed.reverse();
        prop_assert_eq!(
            ConnectionStats::compute(&window_at(now, &values), now, 0, 0),
            ConnectionStats::compute(&window_at(now, &reversed), now, 0, 0)
        );
    }

    #[test]
    fn prop_samples_age_out_of_short_window(age_secs in 60u64..300, duration_ms in 1u64..5_000) {
        let base = Instant::now();
        let window = window_at(base, &[duration_ms]);
        let stats = ConnectionStats::compute(&window, base + Duration::from_secs(age_secs), 1, 0);
        prop_assert_eq!(stats.requests_1m, 0);
        prop_assert_eq!(stats.rt1, 0.0);
        prop_assert_eq!(stats.p90, 0.0);
        prop_assert!(stats.rt5 > 0.0 || duration_ms < 10);
    }
}

// =============================================================================
// 3. Formatting and parsing
// =============================================================================

proptest! {
    #[test]
    fn prop_clip_never_exceeds_width(text in ".{0,120}", width in 0usize..100) {
        let clipped = clip(&text, width);
        let len = text.chars().count();
        prop_assert_eq!(clipped.chars().count(), len.min(width));
        if len <= width {
            prop_assert_eq!(clipped, text);
        } else if width > 0 {
            prop_assert!(clipped.ends_with('~'));
        }
    }

    #[test]
    fn prop_uptime_never_empty(secs in 0u64..10_000_000) {
        let formatted = format_uptime(Duration::from_secs(secs));
        prop_assert!(formatted.ends_with('s'));
    }

    #[test]
    fn prop_status_text_total(code in any::<u16>()) {
        prop_assert!(!status_text(code).is_empty());
    }

    #[test]
    fn prop_port_parse_roundtrip(port in 1u16..=u16::MAX) {
        let parsed: Port = port.to_string().parse().unwrap();
        prop_assert_eq!(parsed.get(), port);
    }
}
