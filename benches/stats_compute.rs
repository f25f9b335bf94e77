//! Benchmarks for the metrics hot paths
//!
//! Measures:
//! - ConnectionStats::compute over a full latency window
//! - recording an event under the collector lock
//! - rendering a full dashboard frame
//!
//! Run with: cargo bench --bench stats_compute

use divan::{Bencher, black_box};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tunnel_relay::console::Dashboard;
use tunnel_relay::metrics::{ResponseTimeWindow, Sample};
use tunnel_relay::network::{AddressSource, PublicAddress};
use tunnel_relay::types::Port;
use tunnel_relay::{ConnectionStats, MetricsCollector, RequestEvent, TunnelSession};

fn main() {
    divan::main();
}

fn full_window(len: usize, now: Instant) -> ResponseTimeWindow {
    let mut window = ResponseTimeWindow::new();
    for i in 0..len {
        window.push(Sample {
            at: now - Duration::from_millis((len - i) as u64 * 250),
            duration_ms: (i as u64 * 37) % 2_000,
        });
    }
    window
}

#[divan::bench(args = [10, 100, 1000])]
fn compute_stats(bencher: Bencher, len: usize) {
    let now = Instant::now();
    let window = full_window(len, now);
    bencher.bench_local(|| ConnectionStats::compute(black_box(&window), now, 1, 0));
}

#[divan::bench]
fn record_event(bencher: Bencher) {
    let metrics = MetricsCollector::new();
    bencher.bench_local(|| {
        metrics.record_event(RequestEvent::new(
            "GET",
            "/api/items",
            200,
            Duration::from_millis(12),
            true,
        ));
    });
}

#[divan::bench]
fn render_frame(bencher: Bencher) {
    let metrics = MetricsCollector::new();
    for i in 0..1000 {
        metrics.record_event(RequestEvent::new(
            "GET",
            format!("/items/{i}"),
            200,
            Duration::from_millis(i % 300),
            true,
        ));
    }
    let session = TunnelSession::new(
        Port::RELAY,
        Port::RELAY_CONSOLE,
        None,
        PublicAddress {
            host: "203.0.113.1".to_string(),
            source: AddressSource::Configured,
        },
    );
    let dashboard = Dashboard::new(Arc::new(session), metrics);
    bencher.bench_local(|| dashboard.render(black_box(Instant::now())));
}
