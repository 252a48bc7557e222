//! OpenAPI document handler
//!
//! A ready-made static route tree serving `*.swagger.json` documents from
//! a directory, for mounting as a `Static` route binding (conventionally
//! under `/openapi`). Every other path is not-found.

use std::path::PathBuf;

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

/// Build a router serving swagger documents out of `dir`.
pub fn openapi_router(dir: impl Into<PathBuf>) -> axum::Router {
    let dir = dir.into();
    axum::Router::new().fallback(move |request: Request| serve_document(dir.clone(), request))
}

async fn serve_document(dir: PathBuf, request: Request) -> Response {
    let path = request.uri().path().trim_start_matches('/');

    if !path.ends_with(".swagger.json") {
        debug!("[OpenAPI] Not found: {path}");
        return StatusCode::NOT_FOUND.into_response();
    }
    // Never step outside the document directory.
    if path.split('/').any(|segment| segment == "..") {
        debug!("[OpenAPI] Rejected traversal: {path}");
        return StatusCode::NOT_FOUND.into_response();
    }

    let file = dir.join(path);
    match tokio::fs::read(&file).await {
        Ok(bytes) => {
            info!("[OpenAPI] Serving {}", file.display());
            (
                [(header::CONTENT_TYPE, "application/json")],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            debug!("[OpenAPI] Failed to read {}: {e}", file.display());
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
