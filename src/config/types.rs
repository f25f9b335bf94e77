//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::network::join_host_port;
use crate::types::{HostName, Port, duration_serde};

/// Main relay configuration
///
/// Every section is optional in the TOML file; missing fields take the
/// defaults from [`super::defaults`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Public listener and upstream target
    #[serde(default)]
    pub relay: RelayConfig,
    /// Status page and terminal dashboard
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Session metadata shown to the operator
    #[serde(default)]
    pub session: SessionConfig,
}

/// Public listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind the public listener to
    pub host: String,
    /// Public relay port
    pub port: Port,
    /// Host of the local service being exposed
    pub upstream_host: HostName,
    /// Port of the local service being exposed
    pub upstream_port: Port,
    /// Time in-flight exchanges get to finish after a shutdown signal
    #[serde(with = "duration_serde")]
    pub shutdown_grace: Duration,
}

impl RelayConfig {
    /// Default bind host (all interfaces)
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";

    /// The upstream as a typed target
    #[must_use]
    pub fn upstream(&self) -> UpstreamTarget {
        UpstreamTarget::new(self.upstream_host.clone(), self.upstream_port)
    }

    /// `host:port` the public listener binds to
    #[must_use]
    pub fn listen_addr(&self) -> String {
        join_host_port(&self.host, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: super::defaults::relay_port(),
            upstream_host: super::defaults::upstream_host(),
            upstream_port: super::defaults::upstream_port(),
            shutdown_grace: super::defaults::shutdown_grace(),
        }
    }
}

/// Status page and dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Address the status page binds to
    pub host: String,
    /// Status page port; each binary has its own default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
    /// Draw the terminal dashboard (false = headless)
    pub enabled: bool,
}

impl ConsoleConfig {
    /// Default status page host (loopback only)
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: None,
            enabled: super::defaults::console_enabled(),
        }
    }
}

/// Session metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionConfig {
    /// Externally visible address; auto-detected when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,
}

/// The single local service the relay forwards to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamTarget {
    host: HostName,
    port: Port,
}

impl UpstreamTarget {
    #[must_use]
    pub fn new(host: HostName, port: Port) -> Self {
        Self { host, port }
    }

    /// `host:port`, as used in the upstream request URI
    #[must_use]
    pub fn authority(&self) -> String {
        join_host_port(self.host.as_str(), self.port)
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}", self.authority())
    }
}
