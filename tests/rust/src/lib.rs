//! Shared test harness for the GrpcMux integration tests.
//!
//! Provides stub gRPC backends (a real HTTP/2 listener with an
//! `UNIMPLEMENTED` fallback and no services), registrars standing in for
//! generated transcoding glue, and helpers for spawning a gateway on a
//! free port.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tonic::service::RoutesBuilder;
use tower::ServiceExt;

use grpcmux_core::{BackendTarget, REQUEST_ID_HEADER};
use grpcmux_gateway::error::GatewayResult;
use grpcmux_gateway::routes::RouteTable;
use grpcmux_gateway::server::{GatewayConfig, GatewayServer};
use grpcmux_gateway::transcode::{upstream_error_response, MethodRegistrar, TranscodingMux};

/// Install a fmt subscriber once; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Reserve a free TCP port on loopback.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind to a free port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

/// Wait until something accepts on `addr`, or panic.
pub async fn wait_for_listener(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("listener {addr} did not come up");
}

/// A live stub backend: a tonic server with no registered services.
///
/// Dials succeed against it and every call comes back `UNIMPLEMENTED`,
/// which is all the gateway-side tests need. Cancelling `shutdown` kills
/// the listener, simulating a backend going down.
pub struct StubBackend {
    pub target: BackendTarget,
    pub shutdown: CancellationToken,
}

pub async fn spawn_stub_backend() -> StubBackend {
    init_tracing();
    let port = free_port();
    let addr: SocketAddr = format!("127.0.0.1:{port}").parse().expect("stub addr");
    let shutdown = CancellationToken::new();

    let routes = RoutesBuilder::default().routes();
    let token = shutdown.clone();
    tokio::spawn(async move {
        let _ = tonic::transport::Server::builder()
            .add_routes(routes)
            .serve_with_shutdown(addr, token.cancelled_owned())
            .await;
    });
    wait_for_listener(addr).await;

    StubBackend {
        target: BackendTarget::new("127.0.0.1", port),
        shutdown,
    }
}

/// A running gateway under test.
pub struct GatewayHandle {
    pub base_url: String,
    pub shutdown: CancellationToken,
    pub handle: tokio::task::JoinHandle<GatewayResult<()>>,
}

/// Spawn a gateway over `table` on a free port and wait for the listener.
pub async fn spawn_gateway(table: RouteTable) -> GatewayHandle {
    init_tracing();
    let port = free_port();
    let config = GatewayConfig {
        host: "127.0.0.1".to_string(),
        port,
        enable_cors: true,
    };
    let shutdown = CancellationToken::new();
    let handle = GatewayServer::new(config, table).spawn(shutdown.clone());
    wait_for_listener(format!("127.0.0.1:{port}").parse().expect("gateway addr")).await;

    GatewayHandle {
        base_url: format!("http://127.0.0.1:{port}"),
        shutdown,
        handle,
    }
}

/// Stand-in for generated transcoding glue: mounts `GET /echo` returning
/// the path and correlation id the handler observed, counting invocations.
pub struct EchoRegistrar {
    pub hits: Arc<AtomicUsize>,
}

impl EchoRegistrar {
    /// Build the registrar together with a handle on its hit counter.
    pub fn with_counter() -> (Arc<Self>, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (Arc::new(Self { hits: hits.clone() }), hits)
    }
}

#[async_trait]
impl MethodRegistrar for EchoRegistrar {
    async fn register(&self, mux: &mut TranscodingMux) -> anyhow::Result<()> {
        let hits = self.hits.clone();
        mux.handle(
            "/echo",
            axum::routing::get(move |uri: Uri, headers: HeaderMap| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({
                        "path": uri.path(),
                        "request_id": headers
                            .get(REQUEST_ID_HEADER)
                            .and_then(|v| v.to_str().ok()),
                    }))
                }
            }),
        );
        Ok(())
    }
}

/// Stand-in glue that actually exercises the backend channel: `GET /poke`
/// fires a raw gRPC request at the backend and reports transport failures
/// as upstream errors.
pub struct ProbeRegistrar;

#[async_trait]
impl MethodRegistrar for ProbeRegistrar {
    async fn register(&self, mux: &mut TranscodingMux) -> anyhow::Result<()> {
        let channel = mux.channel();
        mux.handle(
            "/poke",
            axum::routing::get(move || {
                let channel = channel.clone();
                async move {
                    let request = http::Request::builder()
                        .method(http::Method::POST)
                        .uri("/grpcmux.test.Probe/Ping")
                        .header(header::CONTENT_TYPE, "application/grpc")
                        .header("te", "trailers")
                        .body(tonic::body::empty_body())
                        .expect("static request parts");
                    match channel.oneshot(request).await {
                        Ok(_) => StatusCode::OK.into_response(),
                        Err(_) => upstream_error_response(&tonic::Status::unavailable(
                            "backend unreachable",
                        )),
                    }
                }
            }),
        );
        Ok(())
    }
}

/// A registrar that always fails, for exercising fail-fast registration.
pub struct FailingRegistrar;

#[async_trait]
impl MethodRegistrar for FailingRegistrar {
    async fn register(&self, _mux: &mut TranscodingMux) -> anyhow::Result<()> {
        anyhow::bail!("descriptor mismatch")
    }
}

/// Fire a raw gRPC request at `addr` and return the HTTP-level response.
/// Status codes surface in the `grpc-status` header for trailers-only
/// responses, which is all the stub services here ever produce.
pub async fn raw_grpc_call(addr: SocketAddr, path: &str) -> http::Response<tonic::body::BoxBody> {
    let channel = tonic::transport::Endpoint::from_shared(format!("http://{addr}"))
        .expect("endpoint uri")
        .connect()
        .await
        .expect("connect to rpc server");

    let request = http::Request::builder()
        .method(http::Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/grpc")
        .header("te", "trailers")
        .body(tonic::body::empty_body())
        .expect("static request parts");

    channel.oneshot(request).await.expect("raw call transport")
}

/// Read the `grpc-status` header of a trailers-only response.
pub fn grpc_status(response: &http::Response<tonic::body::BoxBody>) -> Option<i32> {
    response
        .headers()
        .get("grpc-status")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
