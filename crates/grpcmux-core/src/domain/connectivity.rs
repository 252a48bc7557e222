//! Backend connectivity state
//!
//! Runtime state of one backend connection. Never persisted; the gateway
//! updates it from dial and per-call outcomes and the liveness endpoint
//! reads it on demand.

use serde::Serialize;

/// Connectivity state of a backend connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityState {
    /// Created but not yet dialing.
    #[default]
    Idle,
    /// Dial in progress.
    Connecting,
    /// Last call (or the dial) succeeded.
    Ready,
    /// Last call failed at the transport layer; later calls may recover.
    TransientFailure,
    /// Connection closed; terminal.
    Shutdown,
}

impl ConnectivityState {
    /// Canonical string rendering, as reported by the liveness endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::Idle => "IDLE",
            ConnectivityState::Connecting => "CONNECTING",
            ConnectivityState::Ready => "READY",
            ConnectivityState::TransientFailure => "TRANSIENT_FAILURE",
            ConnectivityState::Shutdown => "SHUTDOWN",
        }
    }
}

impl std::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
