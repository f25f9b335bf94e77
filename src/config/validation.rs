//! Configuration validation
//!
//! Zero ports and empty hosts are already impossible by construction; this
//! checks the constraints that span fields.

use anyhow::{Result, bail};

use super::types::Config;

impl Config {
    /// Validate cross-field constraints
    ///
    /// - the status page and the relay cannot share a port
    /// - the relay cannot forward to its own public port on this host
    pub fn validate(&self) -> Result<()> {
        if let Some(console_port) = self.console.port
            && console_port == self.relay.port
        {
            bail!(
                "Console port {} and relay port {} must differ",
                console_port,
                self.relay.port
            );
        }

        if self.relay.upstream_port == self.relay.port
            && is_local_host(self.relay.upstream_host.as_str())
        {
            bail!(
                "Upstream {} points back at the relay's own port",
                self.relay.upstream()
            );
        }

        if self.relay.shutdown_grace.is_zero() {
            tracing::warn!("shutdown_grace is 0; in-flight exchanges will be dropped on shutdown");
        }

        Ok(())
    }
}

fn is_local_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]" | "0.0.0.0" | "::")
}
