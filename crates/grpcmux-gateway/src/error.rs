//! Gateway error types

use thiserror::Error;

use crate::routes::RouteError;

/// Gateway-level errors.
///
/// Every variant here is fatal to startup: the gateway refuses to serve
/// with an invalid table, an unbound listener, an undialed backend, or a
/// partially-registered handler set. Per-request failures are not errors
/// of this type - they surface to the HTTP caller as responses.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    InvalidRoutes(#[from] RouteError),

    #[error("failed to bind gateway listener on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to dial backend {target}: {source}")]
    Dial {
        target: String,
        #[source]
        source: tonic::transport::Error,
    },

    // `anyhow::Error` is not a `std::error::Error`, so the cause is part
    // of the message rather than a `source()`.
    #[error("handler registration failed for prefix '{prefix}': {reason}")]
    Registration { prefix: String, reason: anyhow::Error },
}

pub type GatewayResult<T> = Result<T, GatewayError>;
