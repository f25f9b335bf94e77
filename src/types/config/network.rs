//! Network-related configuration types

use std::num::NonZeroU16;
use std::str::FromStr;

use crate::types::ValidationError;

nonzero_newtype! {
    /// A validated network port number that cannot be zero
    ///
    /// # Examples
    /// ```
    /// use tunnel_relay::types::Port;
    ///
    /// let port = Port::new(3001).unwrap();
    /// assert_eq!(port.get(), 3001);
    ///
    /// // Port 0 is invalid
    /// assert!(Port::new(0).is_none());
    /// ```
    #[doc(alias = "tcp_port")]
    pub struct Port(NonZeroU16: u16, serialize as serialize_u16);
}

impl Port {
    /// Public relay port (3001)
    pub const RELAY: Self = Self(NonZeroU16::new(3001).unwrap());

    /// Status page port for the relay binary (4000)
    pub const RELAY_CONSOLE: Self = Self(NonZeroU16::new(4000).unwrap());

    /// Status page port for the bare monitor (3000)
    pub const MONITOR_CONSOLE: Self = Self(NonZeroU16::new(3000).unwrap());

    /// Local upstream service port (8080)
    pub const UPSTREAM: Self = Self(NonZeroU16::new(8080).unwrap());
}

impl FromStr for Port {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = s
            .trim()
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidPortNumber(s.to_string()))?;
        Self::new(port).ok_or(ValidationError::InvalidPort)
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::InvalidPort)
    }
}
