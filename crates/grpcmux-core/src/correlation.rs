//! Request correlation
//!
//! Every inbound gateway request is stamped with a fresh correlation id
//! under [`REQUEST_ID_HEADER`]. The transcoding glue forwards the header
//! to the backend as gRPC metadata; a backend that echoes it causes the
//! same value to appear on the HTTP response.

use uuid::Uuid;

/// Header (and gRPC metadata key) carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate a fresh correlation id.
pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}
