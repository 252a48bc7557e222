//! CORS policy
//!
//! Echoes the caller's `Origin` back as the allowed origin and answers
//! preflights directly - an `OPTIONS` request carrying
//! `Access-Control-Request-Method` is terminated here with the allow-lists
//! below and never reaches the inner handler.

use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Methods a cross-origin caller may use.
const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
];

/// Request headers a cross-origin caller may send.
const ALLOWED_HEADERS: [header::HeaderName; 3] = [
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::AUTHORIZATION,
];

/// Build the gateway's CORS layer.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS)
}
