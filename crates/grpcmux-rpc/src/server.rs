//! RPC server
//!
//! [`RpcServer`] binds a TCP listener and serves whatever gRPC services
//! the caller's [`ServiceBinder`] registers, with the interception
//! pipeline layered around all of them. Shutdown is external: the server
//! runs until its `CancellationToken` is cancelled.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tonic::service::RoutesBuilder;
use tonic::transport::Server;
use tracing::info;

use crate::hooks::RequestHook;
use crate::intercept::InterceptLayer;
use crate::pipeline::InterceptionPipeline;

/// Registers gRPC services on the live route builder.
///
/// Invoked exactly once at startup. Implementations call
/// `routes.add_service(...)` for each service they own; the builder keeps
/// an `UNIMPLEMENTED` fallback for everything unregistered.
pub trait ServiceBinder: Send + Sync {
    fn bind(&self, routes: &mut RoutesBuilder);
}

/// RPC server configuration.
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

impl RpcServerConfig {
    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid address")
    }
}

/// gRPC server with an interception pipeline around every call.
pub struct RpcServer {
    config: RpcServerConfig,
    binder: Arc<dyn ServiceBinder>,
    hooks: Vec<Arc<dyn RequestHook>>,
}

impl RpcServer {
    /// Create a server that will serve the binder's services.
    pub fn new(config: RpcServerConfig, binder: Arc<dyn ServiceBinder>) -> Self {
        Self {
            config,
            binder,
            hooks: Vec::new(),
        }
    }

    /// Append a hook to the interception pipeline. Order of registration
    /// is the pre-call execution order.
    pub fn with_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Run the server until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let addr = self.config.addr();

        let mut routes = RoutesBuilder::default();
        self.binder.bind(&mut routes);

        let pipeline = InterceptionPipeline::new(self.hooks);

        info!("[RpcServer] Starting gRPC server on {addr}");
        Server::builder()
            .layer(InterceptLayer::new(Arc::new(pipeline)))
            .add_routes(routes.routes())
            .serve_with_shutdown(addr, shutdown.cancelled_owned())
            .await?;

        info!("[RpcServer] Stopped");
        Ok(())
    }

    /// Start the server in the background.
    pub fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
