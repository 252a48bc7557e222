//! HTTP request/response logging middleware
//!
//! One consolidated line per request with method, path, protocol version,
//! selected headers, remote address, response status, and elapsed time.
//! Logging is best-effort by construction - `tracing` emission never
//! blocks the response path and a missing subscriber is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info};

fn header_str<'a>(request: &'a Request, name: &header::HeaderName) -> &'a str {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Log every request on the way in (debug) and out (info).
pub async fn http_logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let version = format!("{:?}", request.version());
    // Present only when served through connect-info; in-process callers
    // (tests, embedded routers) have no peer address.
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    debug!(
        method = %method,
        path = %path,
        version = %version,
        remote = %remote,
        accept = header_str(&request, &header::ACCEPT),
        content_type = header_str(&request, &header::CONTENT_TYPE),
        user_agent = header_str(&request, &header::USER_AGENT),
        origin = header_str(&request, &header::ORIGIN),
        authorization = request.headers().contains_key(header::AUTHORIZATION),
        "→ inbound request"
    );

    let response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        method = %method,
        path = %path,
        version = %version,
        remote = %remote,
        status = response.status().as_u16(),
        elapsed_ms,
        "← request complete"
    );

    response
}
