//! Per-exchange lifecycle tracking
//!
//! An [`ExchangeGuard`] is created when a request arrives and records exactly
//! one [`RequestEvent`] when it is dropped. It travels with the exchange:
//! first inside the request future, then inside the response body via
//! [`TrackedBody`], so the event is recorded after the last body byte has
//! been handed to the client connection, or when the client goes away.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http_body::{Body, Frame, SizeHint};
use tracing::{debug, trace};

use crate::metrics::{MetricsCollector, RequestEvent};

/// Lifecycle of one relayed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Request parsed, nothing sent upstream yet
    Accepted,
    /// Request handed to the upstream client
    Forwarding,
    /// Response fully handed to the client connection
    Completed,
    /// Upstream failed, or the client left before a response existed
    Failed,
}

/// Records one event for an exchange, on drop
#[derive(Debug)]
pub struct ExchangeGuard {
    metrics: MetricsCollector,
    method: String,
    path: String,
    started: Instant,
    /// Upstream status, once a response head arrived
    status: Option<u16>,
    state: ExchangeState,
}

impl ExchangeGuard {
    /// Start tracking an exchange and count it as active
    #[must_use]
    pub fn begin(metrics: MetricsCollector, method: impl Into<String>, path: impl Into<String>) -> Self {
        metrics.request_started();
        Self {
            metrics,
            method: method.into(),
            path: path.into(),
            started: Instant::now(),
            status: None,
            state: ExchangeState::Accepted,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn forwarding(&mut self) {
        self.state = ExchangeState::Forwarding;
    }

    /// The upstream answered with `status`; the body may still be streaming
    pub fn responded(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// The whole response reached the client connection
    pub fn complete(&mut self) {
        if self.status.is_some() {
            self.state = ExchangeState::Completed;
        }
    }

    /// The upstream could not produce a response
    pub fn fail(&mut self) {
        self.status = None;
        self.state = ExchangeState::Failed;
    }

    fn finish(&mut self) -> RequestEvent {
        let elapsed = self.started.elapsed();
        match (self.state, self.status) {
            (ExchangeState::Completed, Some(status)) => {
                trace!(method = %self.method, path = %self.path, status, "Exchange completed");
            }
            (_, Some(status)) => {
                debug!(
                    method = %self.method,
                    path = %self.path,
                    status,
                    "Response body interrupted before it was fully delivered"
                );
            }
            (ExchangeState::Failed, None) => {}
            (_, None) => {
                self.state = ExchangeState::Failed;
                debug!(
                    method = %self.method,
                    path = %self.path,
                    "Client went away before the upstream responded"
                );
            }
        }

        match self.status {
            Some(status) => RequestEvent::new(
                std::mem::take(&mut self.method),
                std::mem::take(&mut self.path),
                status,
                elapsed,
                true,
            ),
            None => RequestEvent::bad_gateway(
                std::mem::take(&mut self.method),
                std::mem::take(&mut self.path),
                elapsed,
            ),
        }
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        let event = self.finish();
        self.metrics.request_finished(event);
    }
}

/// Response body that completes its exchange when fully consumed or dropped
#[derive(Debug)]
pub struct TrackedBody<B: Body> {
    inner: B,
    exchange: Option<ExchangeGuard>,
}

impl<B: Body> TrackedBody<B> {
    #[must_use]
    pub fn new(inner: B, exchange: ExchangeGuard) -> Self {
        Self {
            inner,
            exchange: Some(exchange),
        }
    }

    fn complete(&mut self) {
        if let Some(mut exchange) = self.exchange.take() {
            exchange.complete();
        }
    }
}

impl<B> Body for TrackedBody<B>
where
    B: Body + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;
        let poll = Pin::new(&mut this.inner).poll_frame(cx);
        match &poll {
            Poll::Ready(None) => this.complete(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.complete(),
            _ => {}
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B: Body> Drop for TrackedBody<B> {
    fn drop(&mut self) {
        // Empty bodies may be dropped without ever being polled
        if self.inner.is_end_stream() {
            self.complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Empty, Full};

    fn only_event(metrics: &MetricsCollector) -> RequestEvent {
        let snapshot = metrics.snapshot(Instant::now());
        assert_eq!(snapshot.stats.total, 1);
        assert_eq!(snapshot.stats.active, 0);
        snapshot.recent[0].clone()
    }

    #[test]
    fn test_begin_counts_active() {
        let metrics = MetricsCollector::new();
        let guard = ExchangeGuard::begin(metrics.clone(), "GET", "/");
        assert_eq!(metrics.active(), 1);
        assert_eq!(guard.state(), ExchangeState::Accepted);
        drop(guard);
        assert_eq!(metrics.active(), 0);
    }

    #[test]
    fn test_dropped_before_response_records_502() {
        let metrics = MetricsCollector::new();
        let mut guard = ExchangeGuard::begin(metrics.clone(), "POST", "/upload");
        guard.forwarding();
        drop(guard);

        let event = only_event(&metrics);
        assert_eq!(event.status_code, 502);
        assert_eq!(event.status_text, "Bad Gateway");
        assert!(event.forwarded);
        assert_eq!(event.path, "/upload");
    }

    #[test]
    fn test_failed_exchange_records_502() {
        let metrics = MetricsCollector::new();
        let mut guard = ExchangeGuard::begin(metrics.clone(), "GET", "/");
        guard.forwarding();
        guard.fail();
        assert_eq!(guard.state(), ExchangeState::Failed);
        drop(guard);
        assert_eq!(only_event(&metrics).status_code, 502);
    }

    #[test]
    fn test_completed_exchange_keeps_upstream_status() {
        let metrics = MetricsCollector::new();
        let mut guard = ExchangeGuard::begin(metrics.clone(), "GET", "/missing");
        guard.forwarding();
        guard.responded(404);
        guard.complete();
        assert_eq!(guard.state(), ExchangeState::Completed);
        drop(guard);

        let event = only_event(&metrics);
        assert_eq!(event.status_code, 404);
        assert_eq!(event.method, "GET");
    }

    #[test]
    fn test_complete_without_response_is_ignored() {
        let metrics = MetricsCollector::new();
        let mut guard = ExchangeGuard::begin(metrics.clone(), "GET", "/");
        guard.complete();
        assert_eq!(guard.state(), ExchangeState::Accepted);
    }

    #[tokio::test]
    async fn test_tracked_body_records_after_last_frame() {
        let metrics = MetricsCollector::new();
        let mut guard = ExchangeGuard::begin(metrics.clone(), "GET", "/data");
        guard.forwarding();
        guard.responded(200);

        let body = TrackedBody::new(Full::new(Bytes::from_static(b"hello")), guard);
        assert_eq!(metrics.total(), 0);

        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"hello");

        let event = only_event(&metrics);
        assert_eq!(event.status_code, 200);
        assert!(event.forwarded);
    }

    #[test]
    fn test_tracked_body_dropped_unpolled_records_once() {
        let metrics = MetricsCollector::new();
        let mut guard = ExchangeGuard::begin(metrics.clone(), "HEAD", "/");
        guard.forwarding();
        guard.responded(204);

        let body = TrackedBody::new(Empty::<Bytes>::new(), guard);
        drop(body);

        assert_eq!(only_event(&metrics).status_code, 204);
    }
}
