//! Gateway server
//!
//! [`GatewayServer`] wires the route table, backend connections, and the
//! middleware chain into one axum service and owns the whole lifecycle
//! under a single `CancellationToken`:
//!
//! 1. validate the route table (pure, cannot touch the network),
//! 2. dial every backend sequentially - the first failure aborts startup
//!    before any port is opened,
//! 3. run the registrars against each backend's transcoding mux,
//! 4. bind the listener and serve with graceful shutdown,
//! 5. on cancellation, drain in-flight requests, then close every backend
//!    connection through the [`shutdown::ShutdownCoordinator`].

pub mod health;
mod shutdown;

pub use shutdown::ShutdownCoordinator;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::connection::BackendConnection;
use crate::error::{GatewayError, GatewayResult};
use crate::middleware;
use crate::routes::{RouteBinding, RouteTable};
use crate::transcode::TranscodingMux;

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable the CORS middleware for browser access.
    pub enable_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

impl GatewayConfig {
    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid address")
    }
}

/// HTTP gateway over a fixed set of gRPC backends.
pub struct GatewayServer {
    config: GatewayConfig,
    table: RouteTable,
}

impl GatewayServer {
    /// Create a new gateway over `table`. The table is validated in
    /// [`run`](Self::run), not here.
    pub fn new(config: GatewayConfig, table: RouteTable) -> Self {
        Self { config, table }
    }

    /// Run the gateway until `shutdown` is cancelled.
    ///
    /// Startup is fail-fast: an invalid table, an undialable backend, or a
    /// failing registrar returns before the listener is bound, so the
    /// gateway never serves with dangling routes.
    pub async fn run(self, shutdown: CancellationToken) -> GatewayResult<()> {
        self.table.validate()?;
        let entries = self.table.into_entries();

        // Dial every backend before anything is exposed.
        let mut dialed: Vec<Option<Arc<BackendConnection>>> = Vec::with_capacity(entries.len());
        for entry in &entries {
            match &entry.binding {
                RouteBinding::Backend { target, .. } => {
                    info!(
                        "[Gateway] Dialing backend {} for prefix '{}'",
                        target.address(),
                        entry.prefix
                    );
                    let connection = BackendConnection::dial(target.clone()).await?;
                    dialed.push(Some(Arc::new(connection)));
                }
                RouteBinding::Static(_) => dialed.push(None),
            }
        }

        // Mount every route: transcoded handlers registered per backend,
        // liveness next to each backend prefix, static trees as-is.
        let mut app = axum::Router::new();
        let mut catch_all: Option<axum::Router> = None;
        let mut connections: Vec<Arc<BackendConnection>> = Vec::new();

        for (entry, connection) in entries.into_iter().zip(dialed) {
            let prefix = entry.prefix;
            match entry.binding {
                RouteBinding::Backend { registrars, .. } => {
                    let connection = connection.expect("backend entries are dialed above");

                    let mut mux = TranscodingMux::new(connection.tracked_channel());
                    for registrar in &registrars {
                        registrar.register(&mut mux).await.map_err(|reason| {
                            GatewayError::Registration {
                                prefix: prefix.clone(),
                                reason,
                            }
                        })?;
                    }

                    let liveness = {
                        let connection = connection.clone();
                        move || health::health(connection.clone())
                    };
                    app = app.route(&health::health_path(&prefix), get(liveness));

                    let sub = mux.into_router();
                    if prefix == "/" {
                        catch_all = Some(sub);
                    } else {
                        app = app.nest(&prefix, sub);
                    }
                    connections.push(connection);
                }
                RouteBinding::Static(router) => {
                    if prefix == "/" {
                        catch_all = Some(router);
                    } else {
                        app = app.nest(&prefix, router);
                    }
                }
            }
        }

        app = match catch_all {
            Some(root) => app.fallback_service(root),
            None => app.fallback(not_found),
        };

        // Middleware chain, innermost first: correlation, CORS, logging.
        let mut app = app.layer(axum::middleware::from_fn(
            middleware::correlation_middleware,
        ));
        if self.config.enable_cors {
            app = app.layer(middleware::cors_layer());
        }
        let app = app
            .layer(axum::middleware::from_fn(
                middleware::http_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http());

        // Listener comes last; everything above it already holds.
        let addr = self.config.addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        info!("[Gateway] Listening on {addr}");

        let serve_result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await;
        if let Err(e) = serve_result {
            warn!("[Gateway] Serve loop ended with error: {e}");
        }

        info!("[Gateway] Listener drained; closing backend connections");
        ShutdownCoordinator::new(connections).shutdown().await;
        Ok(())
    }

    /// Start the gateway in the background.
    pub fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<GatewayResult<()>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

/// Routing miss: client-visible not-found, debug-level noise only.
async fn not_found(uri: Uri) -> impl IntoResponse {
    debug!("[Gateway] No route for {}", uri.path());
    StatusCode::NOT_FOUND
}
