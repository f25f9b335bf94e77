//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for configuration values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("invalid hostname: {0}")]
    InvalidHostName(String),

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),

    #[error("port cannot be 0")]
    InvalidPort,
}

/// A validated upstream host name or IP literal
///
/// Never empty, never contains whitespace or a scheme/path separator.
///
/// # Examples
/// ```
/// use tunnel_relay::types::HostName;
///
/// let host = HostName::new("localhost".to_string()).unwrap();
/// assert_eq!(host.as_str(), "localhost");
/// assert!(HostName::new("  ".to_string()).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HostName(String);

impl HostName {
    /// Create a new HostName after validation
    pub fn new(host: String) -> Result<Self, ValidationError> {
        if host.trim().is_empty() {
            return Err(ValidationError::EmptyHostName);
        }
        if host.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(ValidationError::InvalidHostName(host));
        }
        Ok(Self(host))
    }

    /// The loopback host the upstream normally lives on
    #[must_use]
    pub fn localhost() -> Self {
        Self("localhost".to_string())
    }

    /// Get the host as a string slice
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for HostName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for HostName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl<'de> Deserialize<'de> for HostName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
