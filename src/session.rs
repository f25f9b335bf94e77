//! Process-wide tunnel session
//!
//! Built once at startup from the resolved configuration and shared
//! read-only by the console, the status page and the relay.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::config::{Config, UpstreamTarget};
use crate::network::{AddressSource, PublicAddress, join_host_port};
use crate::types::Port;

/// Immutable metadata about this run of the relay
#[derive(Debug, Clone)]
pub struct TunnelSession {
    started_at: Instant,
    relay_port: Port,
    console_port: Port,
    /// Address the status page is bound to
    console_host: String,
    /// `None` for the bare monitor, which does not relay
    upstream: Option<UpstreamTarget>,
    public_address: PublicAddress,
}

impl TunnelSession {
    /// Create a session starting now
    #[must_use]
    pub fn new(
        relay_port: Port,
        console_port: Port,
        upstream: Option<UpstreamTarget>,
        public_address: PublicAddress,
    ) -> Self {
        Self::started_at(
            Instant::now(),
            relay_port,
            console_port,
            upstream,
            public_address,
        )
    }

    /// Create a session with an explicit start instant
    #[must_use]
    pub fn started_at(
        started_at: Instant,
        relay_port: Port,
        console_port: Port,
        upstream: Option<UpstreamTarget>,
        public_address: PublicAddress,
    ) -> Self {
        Self {
            started_at,
            relay_port,
            console_port,
            console_host: "localhost".to_string(),
            upstream,
            public_address,
        }
    }

    /// Build a relaying session from a resolved config
    ///
    /// Detects the public address when the config does not name one.
    #[must_use]
    pub fn for_relay(config: &Config, console_port: Port) -> Self {
        let public_address = PublicAddress::resolve(config.session.public_address.as_deref());
        Self::new(
            config.relay.port,
            console_port,
            Some(config.relay.upstream()),
            public_address,
        )
        .with_console_host(&config.console.host)
    }

    /// Build a monitor-only session from a resolved config
    #[must_use]
    pub fn for_monitor(config: &Config, console_port: Port) -> Self {
        let public_address = PublicAddress::resolve(config.session.public_address.as_deref());
        Self::new(config.relay.port, console_port, None, public_address)
            .with_console_host(&config.console.host)
    }

    /// Set the address the status page is bound to
    #[must_use]
    pub fn with_console_host(mut self, host: &str) -> Self {
        self.console_host = host.to_string();
        self
    }

    /// Time since the session started, as of `now`
    #[must_use]
    pub fn uptime(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// URL the outside world uses to reach the relay
    #[must_use]
    pub fn public_url(&self) -> String {
        format!("http://{}", join_host_port(&self.public_address.host, self.relay_port))
    }

    /// URL of the status page
    ///
    /// Loopback and wildcard binds are reached through `localhost`; any
    /// other bind address is only reachable on that address.
    #[must_use]
    pub fn console_url(&self) -> String {
        let host = match self.console_host.parse::<IpAddr>() {
            Ok(ip) if ip.is_loopback() || ip.is_unspecified() => "localhost",
            _ if self.console_host.is_empty() => "localhost",
            _ => self.console_host.as_str(),
        };
        format!("http://{}", join_host_port(host, self.console_port))
    }

    /// `public -> upstream`, or a note when nothing is relayed
    #[must_use]
    pub fn forwarding(&self) -> String {
        match &self.upstream {
            Some(upstream) => format!("{} -> {}", self.public_url(), upstream),
            None => format!("{} (monitor only)", self.public_url()),
        }
    }

    /// True when the public address is only the loopback fallback
    #[must_use]
    pub fn is_local_only(&self) -> bool {
        self.public_address.source == AddressSource::LoopbackFallback
    }
}
