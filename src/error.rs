//! Error types for the relay
//!
//! Bind failures are fatal and bubble up to `main`. Upstream failures never
//! leave the exchange that hit them: they are classified here, logged, and
//! turned into a 502 row on the dashboard.

use std::error::Error as StdError;
use std::io;
use thiserror::Error;

/// Which listening socket a bind error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerRole {
    /// Public relay port
    Relay,
    /// Local status page port
    Status,
}

impl std::fmt::Display for ListenerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Relay => "relay",
            Self::Status => "status page",
        })
    }
}

/// Errors surfaced by the relay and console components
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RelayError {
    /// A listening socket could not be bound (port in use, no privilege)
    #[error("failed to bind {role} listener on {addr}: {source}")]
    Bind {
        role: ListenerRole,
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The upstream could not be reached or dropped the exchange
    #[error("upstream {target} failed ({kind}): {source}")]
    Upstream {
        target: String,
        kind: UpstreamFailure,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// A bound listener stopped serving
    #[error("{role} server failed: {source}")]
    Serve {
        role: ListenerRole,
        #[source]
        source: io::Error,
    },

    /// Terminal setup or drawing failed
    #[error("terminal I/O error: {0}")]
    Terminal(#[from] io::Error),
}

impl RelayError {
    /// Build an upstream error, classifying the failure from its source chain
    pub fn upstream(target: impl Into<String>, source: impl StdError + Send + Sync + 'static) -> Self {
        let kind = UpstreamFailure::classify(&source);
        Self::Upstream {
            target: target.into(),
            kind,
            source: Box::new(source),
        }
    }

    /// True for errors that must stop the process
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Bind { .. } | Self::Serve { .. })
    }

    /// Log level appropriate for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Self::Bind { .. } | Self::Serve { .. } | Self::Terminal(_) => tracing::Level::ERROR,
            Self::Upstream { kind, .. } => kind.log_level(),
        }
    }
}

/// Coarse classification of why an upstream exchange failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// Nothing is listening on the upstream port
    Refused,
    /// Connect or read timed out
    TimedOut,
    /// Upstream reset or closed the connection mid-exchange
    Reset,
    /// Anything else (protocol errors, DNS)
    Other,
}

impl UpstreamFailure {
    /// Walk an error's source chain looking for an `io::Error` kind
    #[must_use]
    pub fn classify(err: &(dyn StdError + 'static)) -> Self {
        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(io_err) = e.downcast_ref::<io::Error>() {
                return Self::from_io_kind(io_err.kind());
            }
            current = e.source();
        }
        Self::Other
    }

    /// Map an `io::ErrorKind` onto a failure class
    #[must_use]
    pub fn from_io_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::ConnectionRefused => Self::Refused,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::TimedOut,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => Self::Reset,
            _ => Self::Other,
        }
    }

    /// A refused upstream is the normal "service not started yet" case
    #[must_use]
    pub const fn log_level(&self) -> tracing::Level {
        match self {
            Self::Refused => tracing::Level::INFO,
            Self::TimedOut | Self::Reset | Self::Other => tracing::Level::WARN,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Refused => "connection refused",
            Self::TimedOut => "timed out",
            Self::Reset => "connection reset",
            Self::Other => "upstream error",
        }
    }
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
