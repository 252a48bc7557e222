//! `grpcmux-rpc` - standalone gRPC server with a request-interception
//! pipeline.
//!
//! Service implementations stay outside this crate; the caller supplies
//! them through the [`server::ServiceBinder`] capability, invoked once at
//! startup with the live route builder. Every incoming call then passes
//! through the [`pipeline::InterceptionPipeline`]: ordered pre-call hooks
//! (first error short-circuits the call), the handler, then post-call
//! hooks (errors are observational - logged, never fatal to the response).
//!
//! | Concern | Implementation |
//! |---------|----------------|
//! | Hook capability | [`hooks::RequestHook`], [`hooks::LoggingHook`] |
//! | Hook ordering | [`pipeline::InterceptionPipeline`] |
//! | Per-call wrapping | [`intercept::InterceptLayer`] (tower layer) |
//! | Serving | [`server::RpcServer`] under a `CancellationToken` |

pub mod hooks;
pub mod intercept;
pub mod pipeline;
pub mod server;

pub use hooks::{CallContext, LoggingHook, RequestHook};
pub use intercept::InterceptLayer;
pub use pipeline::InterceptionPipeline;
pub use server::{RpcServer, RpcServerConfig, ServiceBinder};
