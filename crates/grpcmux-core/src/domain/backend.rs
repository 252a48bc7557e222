//! Backend target identity
//!
//! A [`BackendTarget`] names one gRPC backend the gateway proxies to:
//! host, port, and the transport the dial should use. Targets are built
//! once from static configuration and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Transport selection for a backend dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Unencrypted HTTP/2.
    #[default]
    Plaintext,
    /// TLS-encrypted HTTP/2.
    ///
    /// `insecure_skip_verify` disables server certificate verification.
    /// Retained for intra-cluster trust boundaries only; never expose a
    /// gateway dialing with this flag to untrusted networks.
    Tls {
        #[serde(default)]
        insecure_skip_verify: bool,
    },
}

impl TransportMode {
    /// URI scheme used when dialing with this mode.
    pub fn scheme(&self) -> &'static str {
        match self {
            TransportMode::Plaintext => "http",
            TransportMode::Tls { .. } => "https",
        }
    }
}

/// Identity of one gRPC backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTarget {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Transport used when dialing.
    #[serde(default)]
    pub mode: TransportMode,
}

impl BackendTarget {
    /// Create a plaintext target.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            mode: TransportMode::Plaintext,
        }
    }

    /// Override the transport mode.
    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Dial address, `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Dial URI with the scheme implied by the transport mode.
    pub fn uri(&self) -> String {
        format!("{}://{}:{}", self.mode.scheme(), self.host, self.port)
    }
}

impl std::fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
