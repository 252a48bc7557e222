//! Transcoding multiplexer
//!
//! Generated transcoding glue lives outside this crate; what it needs from
//! the gateway is (a) a place to mount HTTP method handlers and (b) the
//! channel to the backend those handlers call. [`TranscodingMux`] is that
//! seam: the gateway creates one per backend route and runs the
//! caller-supplied [`MethodRegistrar`]s against it at startup.
//!
//! The projection helpers in this module define the metadata contract the
//! glue is expected to follow: inbound HTTP headers (including the
//! correlation id) become outbound gRPC metadata, and backend response
//! metadata becomes HTTP response headers with `content-type` withheld so
//! the transcoded JSON type always wins.

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::MethodRouter;
use serde_json::json;
use tonic::metadata::MetadataMap;
use tracing::debug;

use crate::connection::TrackedChannel;

/// Attaches a set of transcoded method handlers to a [`TranscodingMux`].
///
/// One registrar typically covers one gRPC service. Registration is
/// atomic from the gateway's point of view: an `Err` aborts startup
/// before the listener is bound, so a partially-registered service never
/// serves traffic.
#[async_trait]
pub trait MethodRegistrar: Send + Sync {
    async fn register(&self, mux: &mut TranscodingMux) -> anyhow::Result<()>;
}

/// Routable multiplexer bound to one backend connection.
pub struct TranscodingMux {
    router: axum::Router,
    channel: TrackedChannel,
}

impl TranscodingMux {
    pub(crate) fn new(channel: TrackedChannel) -> Self {
        Self {
            router: axum::Router::new(),
            channel,
        }
    }

    /// Channel to the backend this mux is bound to. Cloneable; handlers
    /// keep a clone each and share the underlying connection.
    pub fn channel(&self) -> TrackedChannel {
        self.channel.clone()
    }

    /// Mount a method handler under `path` (backend-relative - the route
    /// prefix is already stripped by the time requests arrive here).
    pub fn handle(&mut self, path: &str, handler: MethodRouter) {
        debug!("[Transcode] Mounting handler at {path}");
        self.router = std::mem::take(&mut self.router).route(path, handler);
    }

    pub(crate) fn into_router(self) -> axum::Router {
        self.router
    }
}

/// Project inbound HTTP headers onto outbound gRPC call metadata.
///
/// Hop-by-hop and body-framing headers are withheld; everything else,
/// notably `x-request-id`, travels to the backend.
pub fn call_metadata(headers: &HeaderMap) -> MetadataMap {
    const SKIP: &[&str] = &[
        "host",
        "connection",
        "content-length",
        "content-type",
        "te",
        "transfer-encoding",
        "upgrade",
    ];

    let mut filtered = HeaderMap::new();
    for (name, value) in headers {
        if SKIP.contains(&name.as_str()) {
            continue;
        }
        filtered.append(name, value.clone());
    }
    MetadataMap::from_headers(filtered)
}

/// Project backend response metadata onto HTTP response headers.
///
/// `content-type` is withheld (the transcoded body sets its own) and so
/// are the `grpc-*` protocol keys; everything the backend echoed -
/// including the correlation id, when it chose to echo it - passes
/// through.
pub fn response_headers(metadata: &MetadataMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in metadata.clone().into_headers() {
        let Some(name) = name else { continue };
        if name == axum::http::header::CONTENT_TYPE || name.as_str().starts_with("grpc-") {
            continue;
        }
        headers.append(name, value);
    }
    headers
}

/// Map a gRPC status code onto the HTTP status a client should see.
pub fn grpc_to_http_status(code: tonic::Code) -> StatusCode {
    use tonic::Code;
    match code {
        Code::Ok => StatusCode::OK,
        Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::FailedPrecondition | Code::OutOfRange => StatusCode::BAD_REQUEST,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::Unknown | Code::Internal | Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render a failed backend call as the upstream error the HTTP caller
/// sees. Used by transcoding glue for both gRPC statuses and
/// transport-level failures (the latter map to 503).
pub fn upstream_error_response(status: &tonic::Status) -> Response {
    let http_status = grpc_to_http_status(status.code());
    let body = Json(json!({
        "error": {
            "code": format!("{:?}", status.code()),
            "message": status.message(),
        }
    }));
    (http_status, body).into_response()
}
