//! Request correlation middleware
//!
//! Stamps every inbound request with an `x-request-id` header before it
//! reaches the router. The transcoding glue forwards the header to the
//! backend as call metadata (see `transcode::call_metadata`); a backend
//! that echoes it causes the same value to reappear on the HTTP response
//! via `transcode::response_headers`. A backend that stays silent leaves
//! the response without the header - an accepted asymmetry.

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use grpcmux_core::{new_request_id, REQUEST_ID_HEADER};

/// Assign a correlation id to the request, generating one when the caller
/// did not supply it.
pub async fn correlation_middleware(mut request: Request, next: Next) -> Response {
    if !request.headers().contains_key(REQUEST_ID_HEADER) {
        let id = new_request_id();
        match HeaderValue::from_str(&id) {
            Ok(value) => {
                request.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Err(e) => {
                // Unreachable for UUID output; never fail the request over it.
                warn!("[Correlation] Generated id rejected as header value: {e}");
            }
        }
    }
    next.run(request).await
}
