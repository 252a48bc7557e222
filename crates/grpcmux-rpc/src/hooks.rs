//! Request hooks
//!
//! [`RequestHook`] is the capability interface for code that runs around
//! every unary call: auth checks, validation, audit logging. Both hook
//! points are optional - the defaults do nothing, so a hook implements
//! only the side it cares about.

use async_trait::async_trait;
use tonic::metadata::MetadataMap;
use tonic::Status;
use tracing::info;

/// Per-call context handed to every hook.
///
/// Built once per call from the request envelope, before any hook runs.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Fully-qualified method path, `/package.Service/Method`.
    pub full_method: String,
    /// Incoming request metadata.
    pub metadata: MetadataMap,
}

impl CallContext {
    pub(crate) fn new(full_method: &str, headers: &http::HeaderMap) -> Self {
        Self {
            full_method: full_method.to_string(),
            metadata: MetadataMap::from_headers(headers.clone()),
        }
    }

    /// Bare method name, the part after the last `/`.
    pub fn method_name(&self) -> &str {
        self.full_method
            .rsplit('/')
            .next()
            .unwrap_or(&self.full_method)
    }
}

/// Hook pair invoked around every unary call.
///
/// A `pre_call` error aborts the call before the handler runs and becomes
/// the call's result, unchanged. A `post_call` error is logged by the
/// pipeline and the handler's result still goes out.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Hook name, used in logs when the hook fails.
    fn name(&self) -> &str;

    async fn pre_call(&self, _ctx: &CallContext) -> Result<(), Status> {
        Ok(())
    }

    async fn post_call(&self, _ctx: &CallContext, _code: tonic::Code) -> Result<(), Status> {
        Ok(())
    }
}

/// Hook logging every call under its fully-qualified method name, with the
/// incoming metadata reflected into the entry line when present.
#[derive(Default)]
pub struct LoggingHook;

impl LoggingHook {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RequestHook for LoggingHook {
    fn name(&self) -> &str {
        "call-log"
    }

    async fn pre_call(&self, ctx: &CallContext) -> Result<(), Status> {
        if ctx.metadata.is_empty() {
            info!(method = %ctx.full_method, "→ call received");
        } else {
            info!(
                method = %ctx.full_method,
                metadata = ?ctx.metadata,
                "→ call received"
            );
        }
        Ok(())
    }

    async fn post_call(&self, ctx: &CallContext, code: tonic::Code) -> Result<(), Status> {
        info!(method = %ctx.full_method, code = ?code, "← call complete");
        Ok(())
    }
}
