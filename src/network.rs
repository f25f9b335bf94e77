//! Network helpers: public address detection and socket tuning

use std::io;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::constants::relay::KEEPALIVE_IDLE;

/// How the externally visible address was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// Given on the command line or in the config file
    Configured,
    /// First non-loopback IPv4 interface address
    Detected,
    /// Nothing usable found; loopback for local testing
    LoopbackFallback,
}

/// The address operators and clients use to reach the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicAddress {
    pub host: String,
    pub source: AddressSource,
}

impl PublicAddress {
    /// Use the configured address, or detect one from the local interfaces
    ///
    /// Falls back to `127.0.0.1` with a warning when detection finds nothing.
    #[must_use]
    pub fn resolve(configured: Option<&str>) -> Self {
        if let Some(host) = configured {
            return Self {
                host: host.to_string(),
                source: AddressSource::Configured,
            };
        }

        match detect_public_ipv4() {
            Some(ip) => {
                debug!(address = %ip, "Detected public address");
                Self {
                    host: ip.to_string(),
                    source: AddressSource::Detected,
                }
            }
            None => {
                warn!("Could not detect a non-loopback IPv4 address, falling back to 127.0.0.1");
                Self {
                    host: Ipv4Addr::LOCALHOST.to_string(),
                    source: AddressSource::LoopbackFallback,
                }
            }
        }
    }
}

/// `host:port`, with IPv6 literals in brackets
///
/// Hosts already in brackets are left alone.
#[must_use]
pub fn join_host_port(host: &str, port: impl fmt::Display) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// First usable IPv4 address among the candidates, in order
///
/// Loopback and unspecified addresses are skipped.
#[must_use]
pub fn pick_public_ipv4<I>(candidates: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    candidates.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() => Some(v4),
        _ => None,
    })
}

/// Scan the host's interfaces for the first non-loopback IPv4 address
#[cfg(unix)]
#[must_use]
pub fn detect_public_ipv4() -> Option<Ipv4Addr> {
    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;
    use std::net::SocketAddrV4;

    let interfaces = match getifaddrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("Failed to enumerate network interfaces: {}", e);
            return None;
        }
    };

    let candidates = interfaces
        .filter(|iface| {
            iface.flags.contains(InterfaceFlags::IFF_UP)
                && !iface.flags.contains(InterfaceFlags::IFF_LOOPBACK)
        })
        .filter_map(|iface| {
            let storage = iface.address?;
            let sin = storage.as_sockaddr_in()?;
            Some(IpAddr::V4(*SocketAddrV4::from(*sin).ip()))
        });

    pick_public_ipv4(candidates)
}

#[cfg(not(unix))]
#[must_use]
pub fn detect_public_ipv4() -> Option<Ipv4Addr> {
    None
}

/// Socket options applied to accepted public connections
pub struct SocketOptimizer;

impl SocketOptimizer {
    /// Disable Nagle and enable TCP keepalive on a relayed client socket
    ///
    /// Interactive HTTP traffic is latency bound; keepalive lets dead
    /// clients behind the transport be noticed without a request timeout.
    pub fn tune_public_socket(stream: &TcpStream) -> Result<(), io::Error> {
        use socket2::{SockRef, TcpKeepalive};

        stream.set_nodelay(true)?;
        let sock_ref = SockRef::from(stream);
        sock_ref.set_tcp_keepalive(&TcpKeepalive::new().with_time(KEEPALIVE_IDLE))?;
        Ok(())
    }

    /// Best-effort variant that only logs failures
    pub fn apply(stream: &TcpStream) {
        if let Err(e) = Self::tune_public_socket(stream) {
            debug!("Failed to tune public socket: {}", e);
        }
    }
}
