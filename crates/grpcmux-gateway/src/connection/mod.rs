//! Backend connection lifecycle
//!
//! [`BackendConnection`] owns one `tonic` channel to one gRPC backend and
//! tracks its [`ConnectivityState`] explicitly. The channel multiplexes
//! every in-flight request for that backend; requests never get a
//! connection of their own.
//!
//! Transcoding handlers talk to the backend through a [`TrackedChannel`],
//! a cloneable tower service that folds call outcomes back into the
//! connection state: a transport-level failure flips the state to
//! `TransientFailure`, the next success flips it back to `Ready`, and a
//! closed connection refuses new calls outright.

mod tls;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::RwLock;
use tonic::body::BoxBody;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tower::Service;
use tracing::{debug, info, warn};

use grpcmux_core::{BackendTarget, ConnectivityState, TransportMode};

use crate::error::{GatewayError, GatewayResult};
use crate::BoxError;

/// Default dial timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Live connection to one gRPC backend.
pub struct BackendConnection {
    target: BackendTarget,
    state: Arc<RwLock<ConnectivityState>>,
    channel: Channel,
}

impl BackendConnection {
    /// Dial `target` eagerly and return the live connection.
    ///
    /// The connection passes through `Connecting` during the dial and is
    /// `Ready` when this returns. A dial failure is returned as
    /// [`GatewayError::Dial`]; the caller decides whether that is fatal
    /// (at gateway startup it always is).
    pub async fn dial(target: BackendTarget) -> GatewayResult<Self> {
        let state = Arc::new(RwLock::new(ConnectivityState::Connecting));
        let dial_err = |source| GatewayError::Dial {
            target: target.address(),
            source,
        };

        let endpoint = Endpoint::from_shared(target.uri())
            .map_err(dial_err)?
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT);

        let channel = match target.mode {
            TransportMode::Plaintext => {
                debug!("[Connection] Dialing {} (plaintext)", target.address());
                endpoint.connect().await.map_err(dial_err)?
            }
            TransportMode::Tls {
                insecure_skip_verify: false,
            } => {
                debug!("[Connection] Dialing {} (tls)", target.address());
                endpoint
                    .tls_config(ClientTlsConfig::new().with_native_roots())
                    .map_err(dial_err)?
                    .connect()
                    .await
                    .map_err(dial_err)?
            }
            TransportMode::Tls {
                insecure_skip_verify: true,
            } => {
                // Intra-cluster trust only; the handshake is encrypted but
                // the peer is not authenticated.
                warn!(
                    "[Connection] Dialing {} with certificate verification DISABLED",
                    target.address()
                );
                tls::connect_insecure(endpoint, &target)
                    .await
                    .map_err(dial_err)?
            }
        };

        *state.write() = ConnectivityState::Ready;
        info!("[Connection] Connected to backend {}", target.address());

        Ok(Self {
            target,
            state,
            channel,
        })
    }

    /// The target this connection was dialed against.
    pub fn target(&self) -> &BackendTarget {
        &self.target
    }

    /// Current connectivity state, read live.
    pub fn state(&self) -> ConnectivityState {
        *self.state.read()
    }

    /// Hand out a cloneable channel that records call outcomes into this
    /// connection's state.
    pub fn tracked_channel(&self) -> TrackedChannel {
        TrackedChannel {
            inner: self.channel.clone(),
            state: self.state.clone(),
        }
    }

    /// Close the connection. Idempotent.
    ///
    /// Marks the state `Shutdown`, which makes every [`TrackedChannel`]
    /// clone refuse new calls. The transport itself tears down once the
    /// last channel clone is dropped; in-flight calls race that teardown
    /// and surface transport errors rather than hanging.
    pub async fn close(&self) {
        let previous = {
            let mut state = self.state.write();
            std::mem::replace(&mut *state, ConnectivityState::Shutdown)
        };
        if previous == ConnectivityState::Shutdown {
            debug!(
                "[Connection] Backend {} already closed",
                self.target.address()
            );
            return;
        }
        info!("[Connection] Closed backend {}", self.target.address());
    }
}

impl std::fmt::Debug for BackendConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConnection")
            .field("target", &self.target.address())
            .field("state", &self.state())
            .finish()
    }
}

/// Record a call outcome without resurrecting a closed connection.
fn record(state: &RwLock<ConnectivityState>, next: ConnectivityState) {
    let mut state = state.write();
    if *state != ConnectivityState::Shutdown {
        *state = next;
    }
}

/// Cloneable gRPC channel bound to one backend's connectivity state.
///
/// Implements `tower::Service` over HTTP/2 request/response pairs, which
/// is exactly the bound generated tonic clients need - transcoding glue
/// builds its clients directly over this type.
#[derive(Clone)]
pub struct TrackedChannel {
    inner: Channel,
    state: Arc<RwLock<ConnectivityState>>,
}

impl Service<http::Request<BoxBody>> for TrackedChannel {
    type Response = http::Response<BoxBody>;
    type Error = BoxError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if *self.state.read() == ConnectivityState::Shutdown {
            return Poll::Ready(Err("backend connection closed".into()));
        }
        self.inner.poll_ready(cx).map_err(|e| {
            record(&self.state, ConnectivityState::TransientFailure);
            BoxError::from(e)
        })
    }

    fn call(&mut self, request: http::Request<BoxBody>) -> Self::Future {
        if *self.state.read() == ConnectivityState::Shutdown {
            return Box::pin(std::future::ready::<Result<Self::Response, Self::Error>>(Err(
                "backend connection closed".into(),
            )));
        }

        // Tower contract: the instance that was polled ready makes the call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();

        Box::pin(async move {
            match inner.call(request).await {
                Ok(response) => {
                    record(&state, ConnectivityState::Ready);
                    Ok(response)
                }
                Err(e) => {
                    record(&state, ConnectivityState::TransientFailure);
                    Err(BoxError::from(e))
                }
            }
        })
    }
}

impl std::fmt::Debug for TrackedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedChannel")
            .field("state", &*self.state.read())
            .finish()
    }
}
