use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, Span, field};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Wraps every request in a span and echoes the request / trace ids back.
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let request_id = header_value(&req, REQUEST_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string());
    let trace_id = header_value(&req, TRACE_ID_HEADER).unwrap_or_else(|| request_id.clone());

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        trace_id = %trace_id,
        method = %req.method(),
        path = %path,
        status = field::Empty,
        latency_ms = field::Empty
    );

    let start = Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;
    log_completion(&span, response.status(), start.elapsed().as_millis());

    insert_header(&mut response, REQUEST_ID_HEADER, &request_id);
    insert_header(&mut response, TRACE_ID_HEADER, &trace_id);

    response
}

fn log_completion(span: &Span, status: StatusCode, latency_ms: u128) {
    span.record("status", field::display(status.as_u16()));
    span.record("latency_ms", field::display(latency_ms));

    if status.is_server_error() {
        tracing::error!(parent: span, status = %status.as_u16(), latency_ms = %latency_ms, "Request completed with server error");
    } else if status.is_client_error() {
        tracing::warn!(parent: span, status = %status.as_u16(), latency_ms = %latency_ms, "Request completed with client error");
    } else {
        tracing::info!(parent: span, status = %status.as_u16(), latency_ms = %latency_ms, "Request completed successfully");
    }
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn insert_header(response: &mut Response, name: &'static str, value: &str) {
    if let Ok(header_value) = HeaderValue::from_str(value) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), header_value);
    }
}
