//! Request logging middleware.
//!
//! # Responsibilities
//! - Bind request metadata (method, path, client, query, route) to a per-request logger
//! - Emit a debug "request started" record before the handler runs
//! - Observe status, body bytes and content type of the response
//! - Emit exactly one completion record whose severity follows the status code
//!
//! # Design Decisions
//! - The response body is wrapped; the completion record is emitted when the body reaches
//!   end-of-stream, fails, or is dropped, whichever happens first
//! - `duration_ms` is measured at that same point, so for streamed bodies it includes the
//!   time spent sending the body; for buffered bodies it equals the handler time
//! - The completion record uses the request context captured at request start
//! - A failed log write is reported through `tracing` and never alters the response

use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body::{Body as HttpBody, Frame, SizeHint};
use url::form_urlencoded;

use crate::http::request::{REQUEST_ID_KEY, UNKNOWN_REQUEST_ID};
use crate::logging::{attr, Attr, AttrValue, ContextValue, Level, Logger, RequestContext, SinkError};
use crate::observability::metrics;

/// Severity and message of the completion record for `status`.
///
/// Thresholds are checked from the highest down, so every 5xx is an error regardless of
/// the lower bounds.
pub fn completion_level(status: StatusCode) -> (Level, &'static str) {
    let code = status.as_u16();
    if code >= 500 {
        (Level::Error, "server error")
    } else if code >= 400 {
        (Level::Warn, "client error")
    } else if code >= 300 {
        (Level::Info, "redirect")
    } else {
        (Level::Info, "request completed")
    }
}

/// Log the start and outcome of every request through `logger`.
///
/// Install with `axum::middleware::from_fn_with_state(logger, request_logging)`.
pub async fn request_logging(State(logger): State<Logger>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let ctx = RequestContext::from_extensions(request.extensions());

    let request_id = ctx
        .get(&REQUEST_ID_KEY)
        .and_then(ContextValue::as_str)
        .filter(|id| !id.is_empty())
        .unwrap_or(UNKNOWN_REQUEST_ID)
        .to_string();
    let method = request.method().to_string();

    let mut attrs = vec![
        attr("request_id", request_id),
        attr("method", method.as_str()),
        attr("path", request.uri().path()),
        attr("remote_ip", remote_addr(&request)),
        attr("user_agent", header_str(request.headers(), header::USER_AGENT)),
        attr("referer", header_str(request.headers(), header::REFERER)),
        attr("host", host(&request)),
    ];
    if let Some(query) = request.uri().query().filter(|q| !q.is_empty()) {
        attrs.push(attr("query", query_params(query)));
    }
    if let Some(route) = request.extensions().get::<MatchedPath>() {
        attrs.push(attr("route_pattern", route.as_str()));
    }
    let logger = logger.with(attrs);

    if let Err(err) = logger.log(&ctx, Level::Debug, "request started", []) {
        report_failure(&err);
    }

    let response = next.run(request).await;

    let pending = PendingObservation {
        logger,
        ctx,
        method,
        status: response.status(),
        content_type: header_str(response.headers(), header::CONTENT_TYPE),
        start,
    };
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(ObservedBody::new(body, pending)))
}

fn remote_addr(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}

fn host(request: &Request) -> String {
    let from_header = header_str(request.headers(), header::HOST);
    if !from_header.is_empty() {
        return from_header;
    }
    request
        .uri()
        .authority()
        .map(|a| a.to_string())
        .unwrap_or_default()
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Decoded query parameters; repeated keys are joined with `,`.
fn query_params(query: &str) -> Vec<Attr> {
    let mut params: Vec<Attr> = Vec::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match params.iter_mut().find(|a| a.key == key) {
            Some(Attr {
                value: AttrValue::Str(existing),
                ..
            }) => {
                existing.push(',');
                existing.push_str(&value);
            }
            _ => params.push(attr(key.into_owned(), value.into_owned())),
        }
    }
    params
}

fn report_failure(err: &SinkError) {
    tracing::warn!(error = %err, "failed to emit request log record");
}

/// Everything needed for the completion record except the byte count.
struct PendingObservation {
    logger: Logger,
    ctx: RequestContext,
    method: String,
    status: StatusCode,
    content_type: String,
    start: Instant,
}

impl PendingObservation {
    fn complete(self, bytes: u64) {
        let elapsed = self.start.elapsed();
        let duration_ms = elapsed.as_micros() as f64 / 1000.0;
        let (level, message) = completion_level(self.status);

        let mut attrs = vec![
            attr("status", self.status.as_u16()),
            attr("bytes", bytes),
            attr("duration_ms", duration_ms),
        ];
        if !self.content_type.is_empty() {
            attrs.push(attr("content_type", self.content_type));
        }

        if let Err(err) = self.logger.log(&self.ctx, level, message, attrs) {
            report_failure(&err);
        }
        metrics::record_request(&self.method, self.status.as_u16(), elapsed, bytes);
    }
}

/// Response body counting data bytes and completing the observation once.
struct ObservedBody {
    inner: Body,
    bytes: u64,
    pending: Option<PendingObservation>,
}

impl ObservedBody {
    fn new(inner: Body, pending: PendingObservation) -> Self {
        Self {
            inner,
            bytes: 0,
            pending: Some(pending),
        }
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.complete(self.bytes);
        }
    }
}

impl HttpBody for ObservedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.bytes += data.len() as u64;
                }
            }
            Poll::Ready(Some(Err(_))) | Poll::Ready(None) => this.finish(),
            Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for ObservedBody {
    fn drop(&mut self) {
        self.finish();
    }
}
