//! Command-line argument parsing shared by the relay and monitor binaries
//!
//! Positional arguments follow the operator's muscle memory:
//! `tunnel-relay [CONSOLE_PORT] [RELAY_PORT] [PUBLIC_ADDR]`. Every argument
//! also reads an environment variable and overrides the config file.

use crate::config::Config;
use crate::constants::files;
use crate::types::{HostName, Port, ThreadCount};
use clap::Parser;
use std::path::PathBuf;

/// Arguments common to every binary
///
/// Use `#[command(flatten)]` in binary-specific Args to include these fields.
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    /// Local status page port
    #[arg(value_name = "CONSOLE_PORT", env = "TUNNEL_CONSOLE_PORT")]
    pub console_port: Option<Port>,

    /// Public relay port
    #[arg(value_name = "RELAY_PORT", env = "TUNNEL_RELAY_PORT")]
    pub relay_port: Option<Port>,

    /// Externally visible address (auto-detected when omitted)
    #[arg(value_name = "PUBLIC_ADDR", env = "TUNNEL_PUBLIC_ADDR")]
    pub public_address: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = files::CONFIG, env = "TUNNEL_CONFIG")]
    pub config: PathBuf,

    /// Number of worker threads (default: 1, use 0 for CPU cores)
    #[arg(short, long, env = "TUNNEL_THREADS")]
    pub threads: Option<ThreadCount>,

    /// Disable the terminal dashboard and log to stdout instead
    #[arg(long, default_value_t = false, env = "TUNNEL_NO_CONSOLE")]
    pub no_console: bool,
}

impl CommonArgs {
    /// Apply command-line overrides on top of a loaded config
    ///
    /// `default_console_port` is used when neither the command line nor the
    /// config file names one.
    pub fn apply_to(&self, config: &mut Config, default_console_port: Port) {
        config.console.port = Some(
            self.console_port
                .or(config.console.port)
                .unwrap_or(default_console_port),
        );
        if let Some(port) = self.relay_port {
            config.relay.port = port;
        }
        if let Some(addr) = self.public_address.as_ref().filter(|a| !a.trim().is_empty()) {
            config.session.public_address = Some(addr.trim().to_string());
        }
        if self.no_console {
            config.console.enabled = false;
        }
    }

    /// Whether the terminal dashboard should be drawn
    #[must_use]
    pub fn console_enabled(&self, config: &Config) -> bool {
        !self.no_console && config.console.enabled
    }
}

/// Upstream selection, only meaningful for the relay binary
#[derive(Parser, Debug, Clone, Default)]
pub struct UpstreamArgs {
    /// Host of the local service to expose
    #[arg(long, env = "TUNNEL_UPSTREAM_HOST")]
    pub upstream_host: Option<HostName>,

    /// Port of the local service to expose
    #[arg(long, env = "TUNNEL_UPSTREAM_PORT")]
    pub upstream_port: Option<Port>,
}

impl UpstreamArgs {
    /// Apply upstream overrides on top of a loaded config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(host) = &self.upstream_host {
            config.relay.upstream_host = host.clone();
        }
        if let Some(port) = self.upstream_port {
            config.relay.upstream_port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser, Debug)]
    struct TestArgs {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        upstream: UpstreamArgs,
    }

    fn parse(argv: &[&str]) -> TestArgs {
        TestArgs::try_parse_from(std::iter::once("tunnel-relay").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_no_arguments() {
        let args = parse(&[]);
        assert!(args.common.console_port.is_none());
        assert!(args.common.relay_port.is_none());
        assert!(args.common.public_address.is_none());
        assert_eq!(args.common.config, PathBuf::from(files::CONFIG));

        let mut config = Config::default();
        args.common.apply_to(&mut config, Port::RELAY_CONSOLE);
        assert_eq!(config.console.port, Some(Port::RELAY_CONSOLE));
        assert_eq!(config.relay.port, Port::RELAY);
    }

    #[test]
    fn test_positional_arguments() {
        let args = parse(&["4100", "3101", "198.51.100.4"]);
        let mut config = Config::default();
        args.common.apply_to(&mut config, Port::RELAY_CONSOLE);
        assert_eq!(config.console.port, Port::new(4100));
        assert_eq!(config.relay.port, Port::new(3101).unwrap());
        assert_eq!(config.session.public_address.as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn test_config_console_port_beats_binary_default() {
        let args = parse(&[]);
        let mut config = Config::default();
        config.console.port = Port::new(5000);
        args.common.apply_to(&mut config, Port::MONITOR_CONSOLE);
        assert_eq!(config.console.port, Port::new(5000));
    }

    #[test]
    fn test_cli_beats_config() {
        let args = parse(&["4200"]);
        let mut config = Config::default();
        config.console.port = Port::new(5000);
        args.common.apply_to(&mut config, Port::MONITOR_CONSOLE);
        assert_eq!(config.console.port, Port::new(4200));
    }

    #[test]
    fn test_zero_port_rejected() {
        let result = TestArgs::try_parse_from(["tunnel-relay", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_console_flag() {
        let args = parse(&["--no-console"]);
        let mut config = Config::default();
        assert!(!args.common.console_enabled(&config));
        args.common.apply_to(&mut config, Port::RELAY_CONSOLE);
        assert!(!config.console.enabled);
    }

    #[test]
    fn test_upstream_overrides() {
        let args = parse(&["--upstream-host", "127.0.0.1", "--upstream-port", "5173"]);
        let mut config = Config::default();
        args.upstream.apply_to(&mut config);
        assert_eq!(config.relay.upstream().authority(), "127.0.0.1:5173");
    }

    #[test]
    fn test_blank_public_address_ignored() {
        let args = parse(&["4000", "3001", " "]);
        let mut config = Config::default();
        args.common.apply_to(&mut config, Port::RELAY_CONSOLE);
        assert!(config.session.public_address.is_none());
    }
}
