//! # GrpcMux Core Library
//!
//! Domain types shared by the gateway and the RPC server.
//!
//! ## Modules
//!
//! - `domain` - Core value types (BackendTarget, TransportMode, ConnectivityState)
//! - `correlation` - Request correlation id header and generation

pub mod correlation;
pub mod domain;

// Re-export commonly used types
pub use correlation::{new_request_id, REQUEST_ID_HEADER};
pub use domain::*;
