//! Request forwarding to the upstream service
//!
//! One upstream attempt per inbound request, no retries. Method, path, query,
//! headers and both bodies pass through unchanged and streamed.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Request, Response, StatusCode, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use tracing::{Level, info, warn};

use super::exchange::{ExchangeGuard, TrackedBody};
use crate::config::UpstreamTarget;
use crate::constants::relay::{BAD_GATEWAY_BODY, UPSTREAM_CONNECT_TIMEOUT, UPSTREAM_POOL_IDLE};
use crate::error::RelayError;
use crate::metrics::MetricsCollector;

/// Body type of every relay response, upstream or synthesized
pub type RelayBody = UnsyncBoxBody<Bytes, hyper::Error>;

/// Response returned by the relay service
pub type RelayResponse = Response<TrackedBody<RelayBody>>;

/// Forwards requests to one upstream through a pooled HTTP/1 client
#[derive(Debug)]
pub struct Forwarder {
    client: Client<HttpConnector, Incoming>,
    upstream: UpstreamTarget,
    authority: String,
    metrics: MetricsCollector,
}

impl Forwarder {
    #[must_use]
    pub fn new(upstream: UpstreamTarget, metrics: MetricsCollector) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(UPSTREAM_CONNECT_TIMEOUT));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(UPSTREAM_POOL_IDLE)
            .pool_timer(TokioTimer::new())
            .build(connector);

        let authority = upstream.authority();
        Self {
            client,
            upstream,
            authority,
            metrics,
        }
    }

    /// Relay one request and return the response to send to the client
    ///
    /// Never fails: upstream errors become a 502 response.
    pub async fn forward(&self, mut req: Request<Incoming>) -> RelayResponse {
        let path = display_path(req.uri()).to_string();
        let mut exchange = ExchangeGuard::begin(self.metrics.clone(), req.method().as_str(), path);

        match self.upstream_uri(req.uri()) {
            Ok(uri) => *req.uri_mut() = uri,
            Err(e) => {
                warn!("Cannot build upstream URI for {}: {}", req.uri(), e);
                exchange.fail();
                return bad_gateway(exchange);
            }
        }

        exchange.forwarding();
        match self.client.request(req).await {
            Ok(response) => {
                exchange.responded(response.status().as_u16());
                response.map(|body| TrackedBody::new(body.boxed_unsync(), exchange))
            }
            Err(e) => {
                log_upstream_failure(&RelayError::upstream(self.upstream.to_string(), e));
                exchange.fail();
                bad_gateway(exchange)
            }
        }
    }

    /// Absolute URI on the upstream with the original path and query
    fn upstream_uri(&self, uri: &Uri) -> Result<Uri, http::Error> {
        Uri::builder()
            .scheme("http")
            .authority(self.authority.as_str())
            .path_and_query(display_path(uri))
            .build()
    }
}

/// Path plus query as the client sent it
fn display_path(uri: &Uri) -> &str {
    uri.path_and_query().map_or("/", |pq| pq.as_str())
}

/// Minimal 502 response; the exchange is recorded once this body is sent
fn bad_gateway(exchange: ExchangeGuard) -> RelayResponse {
    let body: RelayBody = Full::new(Bytes::from_static(BAD_GATEWAY_BODY.as_bytes()))
        .map_err(|never| match never {})
        .boxed_unsync();
    let mut response = Response::new(TrackedBody::new(body, exchange));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn log_upstream_failure(err: &RelayError) {
    if err.log_level() == Level::INFO {
        info!("{}", err);
    } else {
        warn!("{}", err);
    }
}
