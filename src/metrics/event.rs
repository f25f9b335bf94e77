//! Completed-exchange events and HTTP status text
//!
//! A [`RequestEvent`] is created once, when an exchange reaches a terminal
//! state, and is never modified afterwards.

use chrono::{DateTime, Local};
use std::time::Duration;

/// One completed HTTP exchange as seen by the metrics engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEvent {
    /// Wall-clock completion time (shown in the request table)
    pub timestamp: DateTime<Local>,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub status_text: &'static str,
    /// Time from request arrival to completion
    pub duration_ms: u64,
    /// True when the exchange went through the relay to the upstream,
    /// false for requests answered locally by the status page
    pub forwarded: bool,
}

impl RequestEvent {
    /// Create an event stamped with the current wall-clock time
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        status_code: u16,
        duration: Duration,
        forwarded: bool,
    ) -> Self {
        Self::with_timestamp(Local::now(), method, path, status_code, duration, forwarded)
    }

    /// Create an event with an explicit timestamp
    #[must_use]
    pub fn with_timestamp(
        timestamp: DateTime<Local>,
        method: impl Into<String>,
        path: impl Into<String>,
        status_code: u16,
        duration: Duration,
        forwarded: bool,
    ) -> Self {
        Self {
            timestamp,
            method: method.into(),
            path: path.into(),
            status_code,
            status_text: status_text(status_code),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            forwarded,
        }
    }

    /// Synthesized event for an exchange the upstream never answered
    #[must_use]
    pub fn bad_gateway(method: impl Into<String>, path: impl Into<String>, duration: Duration) -> Self {
        Self::new(method, path, 502, duration, true)
    }
}

/// Reason phrase for an HTTP status code
///
/// Fixed table of the codes a relay realistically sees; anything else is
/// reported as "Unknown".
#[must_use]
pub const fn status_text(code: u16) -> &'static str {
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}
