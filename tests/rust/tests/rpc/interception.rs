//! End-to-end interception pipeline tests
//!
//! The server runs with no registered services, so tonic's
//! `UNIMPLEMENTED` fallback plays the role of the handler: a call that
//! reaches it comes back with status 12, and anything else proves the
//! pipeline intervened.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use order_log::OrderLog;
use pretty_assertions::assert_eq;
use tests::{free_port, grpc_status, init_tracing, raw_grpc_call, wait_for_listener};
use tokio_util::sync::CancellationToken;
use tonic::service::RoutesBuilder;
use tonic::Status;

use grpcmux_rpc::{
    CallContext, LoggingHook, RequestHook, RpcServer, RpcServerConfig, ServiceBinder,
};

/// Records call ordering across hooks.
mod order_log {
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct OrderLog(Mutex<Vec<String>>);

    impl OrderLog {
        pub fn push(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }

        pub fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }
}

/// Binder registering nothing; the routes fallback answers every call.
struct NoopBinder;

impl ServiceBinder for NoopBinder {
    fn bind(&self, _routes: &mut RoutesBuilder) {}
}

struct RejectingHook {
    pre_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RequestHook for RejectingHook {
    fn name(&self) -> &str {
        "rejecting"
    }

    async fn pre_call(&self, _ctx: &CallContext) -> Result<(), Status> {
        self.pre_calls.fetch_add(1, Ordering::SeqCst);
        Err(Status::permission_denied("no token"))
    }
}

struct FailingPostHook {
    post_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RequestHook for FailingPostHook {
    fn name(&self) -> &str {
        "failing-post"
    }

    async fn post_call(&self, _ctx: &CallContext, _code: tonic::Code) -> Result<(), Status> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        Err(Status::internal("audit sink unreachable"))
    }
}

struct OrderedHook {
    label: &'static str,
    log: Arc<OrderLog>,
}

#[async_trait]
impl RequestHook for OrderedHook {
    fn name(&self) -> &str {
        self.label
    }

    async fn pre_call(&self, _ctx: &CallContext) -> Result<(), Status> {
        self.log.push(format!("pre-{}", self.label));
        Ok(())
    }

    async fn post_call(&self, _ctx: &CallContext, _code: tonic::Code) -> Result<(), Status> {
        self.log.push(format!("post-{}", self.label));
        Ok(())
    }
}

#[tokio::test]
async fn unknown_service_returns_unimplemented_through_the_pipeline() {
    init_tracing();
    let port = free_port();
    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port,
    };
    let addr = config.addr();
    let shutdown = CancellationToken::new();
    let handle = RpcServer::new(config, Arc::new(NoopBinder))
        .with_hook(Arc::new(LoggingHook::new()))
        .spawn(shutdown.clone());
    wait_for_listener(addr).await;

    let response = raw_grpc_call(addr, "/grpcmux.test.Missing/Call").await;
    assert_eq!(grpc_status(&response), Some(tonic::Code::Unimplemented as i32));

    shutdown.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn pre_call_rejection_short_circuits_the_handler() {
    init_tracing();
    let pre_calls = Arc::new(AtomicUsize::new(0));
    let port = free_port();
    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port,
    };
    let addr = config.addr();
    let shutdown = CancellationToken::new();
    RpcServer::new(config, Arc::new(NoopBinder))
        .with_hook(Arc::new(RejectingHook {
            pre_calls: pre_calls.clone(),
        }))
        .spawn(shutdown.clone());
    wait_for_listener(addr).await;

    let response = raw_grpc_call(addr, "/grpcmux.test.Missing/Call").await;

    // The fallback handler would have answered UNIMPLEMENTED (12); the
    // hook's PERMISSION_DENIED (7) proves the call never reached it.
    assert_eq!(
        grpc_status(&response),
        Some(tonic::Code::PermissionDenied as i32)
    );
    assert_eq!(
        response.headers()["grpc-message"].to_str().unwrap(),
        "no token"
    );
    assert_eq!(pre_calls.load(Ordering::SeqCst), 1);

    shutdown.cancel();
}

#[tokio::test]
async fn post_call_failure_leaves_the_result_unchanged() {
    init_tracing();
    let post_calls = Arc::new(AtomicUsize::new(0));
    let port = free_port();
    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port,
    };
    let addr = config.addr();
    let shutdown = CancellationToken::new();
    RpcServer::new(config, Arc::new(NoopBinder))
        .with_hook(Arc::new(FailingPostHook {
            post_calls: post_calls.clone(),
        }))
        .spawn(shutdown.clone());
    wait_for_listener(addr).await;

    let response = raw_grpc_call(addr, "/grpcmux.test.Missing/Call").await;

    // The post hook failed, but the handler's UNIMPLEMENTED result still
    // went out untouched.
    assert_eq!(grpc_status(&response), Some(tonic::Code::Unimplemented as i32));
    assert_eq!(post_calls.load(Ordering::SeqCst), 1);

    shutdown.cancel();
}

#[tokio::test]
async fn hooks_nest_around_the_call() {
    init_tracing();
    let log = Arc::new(OrderLog::default());
    let port = free_port();
    let config = RpcServerConfig {
        host: "127.0.0.1".to_string(),
        port,
    };
    let addr = config.addr();
    let shutdown = CancellationToken::new();
    RpcServer::new(config, Arc::new(NoopBinder))
        .with_hook(Arc::new(OrderedHook {
            label: "outer",
            log: log.clone(),
        }))
        .with_hook(Arc::new(OrderedHook {
            label: "inner",
            log: log.clone(),
        }))
        .spawn(shutdown.clone());
    wait_for_listener(addr).await;

    raw_grpc_call(addr, "/grpcmux.test.Missing/Call").await;

    assert_eq!(
        log.entries(),
        vec!["pre-outer", "pre-inner", "post-inner", "post-outer"]
    );

    shutdown.cancel();
}
