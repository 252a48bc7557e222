//! `grpcmux-gateway` - HTTP/JSON front door for a set of gRPC backends.
//!
//! The gateway owns one HTTP listener and a fixed, prefix-keyed routing
//! table. Each backend-backed route gets its own live gRPC connection and a
//! [`transcode::TranscodingMux`] that externally-supplied
//! [`transcode::MethodRegistrar`]s mount transcoded method handlers on.
//!
//! | Concern | Implementation |
//! |---------|----------------|
//! | Backend connections | [`connection::BackendConnection`], [`connection::TrackedChannel`] |
//! | Prefix routing | [`routes::RouteTable`] assembled in [`server::GatewayServer`] |
//! | Cross-cutting middleware | [`middleware`] (logging, CORS, correlation) |
//! | Liveness endpoints | `<prefix>/health`, see [`server`] |
//! | Lifecycle | [`server::GatewayServer::run`] under one `CancellationToken` |
//!
//! The gateway never parses request bodies itself; transcoding is the
//! registrars' job. It also never installs a log sink - the host process
//! configures `tracing` before calling [`server::GatewayServer::run`].

pub mod connection;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod transcode;

pub use error::{GatewayError, GatewayResult};

/// Boxed error type used at tower service boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
