//! Per-backend liveness endpoint
//!
//! `GET <prefix>/health` reports the backend connection's state as seen at
//! request time. Health is advisory: a serialization failure is logged and
//! the client gets an empty internal-error response, nothing more.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use grpcmux_core::ConnectivityState;

use crate::connection::BackendConnection;

/// Liveness response body.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: ConnectivityState,
    pub connection: String,
}

/// Handle one liveness request against `connection`.
pub async fn health(connection: Arc<BackendConnection>) -> Response {
    let body = HealthResponse {
        status: connection.state(),
        connection: connection.target().address(),
    };

    match serde_json::to_vec(&body) {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "application/json")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("[Health] Failed to serialize response: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Path of the liveness route for a given prefix.
pub fn health_path(prefix: &str) -> String {
    if prefix == "/" {
        "/health".to_string()
    } else {
        format!("{prefix}/health")
    }
}
