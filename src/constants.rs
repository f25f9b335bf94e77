//! Constants used throughout the relay
//!
//! Centralizes capacities, window lengths and timing values so the metrics
//! engine, the console and the tests agree on them.

use std::time::Duration;

/// Rolling aggregate capacities and windows
pub mod metrics {
    use super::Duration;

    /// Number of events kept in the request table
    pub const REQUEST_LOG_CAPACITY: usize = 20;

    /// Number of latency samples kept for windowed statistics
    ///
    /// Eviction is by count only; an old sample survives as long as fewer
    /// than this many newer samples have arrived.
    pub const RESPONSE_WINDOW_CAPACITY: usize = 1000;

    /// Short statistics window (rt1, p50, p90, requests_1m)
    pub const WINDOW_1M: Duration = Duration::from_secs(60);

    /// Long statistics window (rt5)
    pub const WINDOW_5M: Duration = Duration::from_secs(300);

    const _LOG_FITS_WINDOW: () = assert!(REQUEST_LOG_CAPACITY <= RESPONSE_WINDOW_CAPACITY);
}

/// Console rendering
pub mod console {
    use super::Duration;

    /// Redraw period of the terminal dashboard
    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

    /// Period of the stats summary line in headless mode
    pub const HEADLESS_LOG_INTERVAL: Duration = Duration::from_secs(30);

    /// Width of the off-screen frame used for text rendering
    pub const FRAME_WIDTH: u16 = 80;

    /// Height of the off-screen frame; fits the header and a full request log
    pub const FRAME_HEIGHT: u16 = 32;

    /// Width of the label column in the session block
    pub const LABEL_WIDTH: u16 = 30;

    /// Width of one stats column
    pub const STATS_COLUMN_WIDTH: u16 = 7;

    /// Width of the path column in the request table
    pub const PATH_WIDTH: u16 = 32;

    /// Seconds between status page reloads
    pub const STATUS_PAGE_REFRESH_SECS: u64 = 5;
}

/// Relay connection handling
pub mod relay {
    use super::Duration;

    /// Default time in-flight exchanges get to finish after shutdown
    pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

    /// TCP keepalive idle time on accepted public sockets
    pub const KEEPALIVE_IDLE: Duration = Duration::from_secs(60);

    /// Upstream TCP connect timeout before an exchange fails with 502
    pub const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Idle pooled upstream connections are closed after this long
    pub const UPSTREAM_POOL_IDLE: Duration = Duration::from_secs(90);

    /// Body sent with a synthesized 502
    pub const BAD_GATEWAY_BODY: &str = "502 Bad Gateway\n";
}

/// Default file names
pub mod files {
    /// Default configuration file
    pub const CONFIG: &str = "tunnel-relay.toml";

    /// Log file written next to the working directory
    pub const LOG: &str = "tunnel-relay.log";
}
