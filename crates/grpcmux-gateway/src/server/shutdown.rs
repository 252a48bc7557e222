//! Shutdown coordination
//!
//! The lifecycle controller hands every backend connection to a
//! [`ShutdownCoordinator`] once the HTTP listener has drained. Closes run
//! one at a time with a bounded wait each; a close that fails or times out
//! is logged and the coordinator moves on - teardown never aborts teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::connection::BackendConnection;

/// Upper bound on a single connection close.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tracks every closer the gateway spawned and waits for each with a
/// bounded timeout.
pub struct ShutdownCoordinator {
    connections: Vec<Arc<BackendConnection>>,
}

impl ShutdownCoordinator {
    pub fn new(connections: Vec<Arc<BackendConnection>>) -> Self {
        Self { connections }
    }

    /// Close every tracked connection.
    pub async fn shutdown(self) {
        let total = self.connections.len();
        info!("[Shutdown] Closing {total} backend connection(s)");

        for connection in self.connections {
            let address = connection.target().address();
            match timeout(CLOSE_TIMEOUT, connection.close()).await {
                Ok(()) => info!("[Shutdown] Closed {address}"),
                Err(_) => warn!(
                    "[Shutdown] Close of {address} timed out after {CLOSE_TIMEOUT:?}; continuing"
                ),
            }
        }

        info!("[Shutdown] Teardown complete");
    }
}
