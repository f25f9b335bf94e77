//! Default values for configuration fields

use crate::constants::relay::SHUTDOWN_GRACE;
use crate::types::{HostName, Port};
use std::time::Duration;

/// Default public relay port
#[inline]
pub fn relay_port() -> Port {
    Port::RELAY
}

/// Default upstream host
#[inline]
pub fn upstream_host() -> HostName {
    HostName::localhost()
}

/// Default upstream port
#[inline]
pub fn upstream_port() -> Port {
    Port::UPSTREAM
}

/// Default shutdown grace period
#[inline]
pub fn shutdown_grace() -> Duration {
    SHUTDOWN_GRACE
}

/// Dashboard is drawn unless disabled
#[inline]
pub fn console_enabled() -> bool {
    true
}
