//! Interception pipeline
//!
//! Ordered execution of [`RequestHook`]s around a call:
//!
//! `received -> pre_call* -> handler -> post_call* -> complete`
//!
//! Pre-call hooks run in registration order and the first error
//! short-circuits - the handler and every post-call hook are skipped and
//! the error becomes the call's result. Post-call hooks run in reverse
//! order (innermost hook sees the result first); their errors are logged
//! and swallowed.

use std::sync::Arc;

use tonic::Status;
use tracing::warn;

use crate::hooks::{CallContext, RequestHook};

/// Ordered list of hooks executed as a pipeline.
#[derive(Default)]
pub struct InterceptionPipeline {
    hooks: Vec<Arc<dyn RequestHook>>,
}

impl InterceptionPipeline {
    pub fn new(hooks: Vec<Arc<dyn RequestHook>>) -> Self {
        Self { hooks }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every pre-call hook in order. The first error aborts the call.
    pub async fn pre_call(&self, ctx: &CallContext) -> Result<(), Status> {
        for hook in &self.hooks {
            if let Err(status) = hook.pre_call(ctx).await {
                warn!(
                    method = %ctx.full_method,
                    hook = hook.name(),
                    code = ?status.code(),
                    "pre-call hook aborted the call"
                );
                return Err(status);
            }
        }
        Ok(())
    }

    /// Run every post-call hook in reverse order. Errors are logged and
    /// never surfaced - the handler's result is already decided.
    pub async fn post_call(&self, ctx: &CallContext, code: tonic::Code) {
        for hook in self.hooks.iter().rev() {
            if let Err(status) = hook.post_call(ctx, code).await {
                warn!(
                    method = %ctx.full_method,
                    hook = hook.name(),
                    error = %status,
                    "post-call hook failed (result unaffected)"
                );
            }
        }
    }
}
