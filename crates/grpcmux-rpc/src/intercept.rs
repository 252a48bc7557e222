//! Tower middleware applying the interception pipeline
//!
//! [`InterceptLayer`] wraps the server's whole route set, so every
//! incoming call - whatever service it lands on - passes through the same
//! hook chain. A pre-call rejection is answered as a trailers-only gRPC
//! error response; the handler is never invoked.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::HeaderValue;
use tonic::body::BoxBody;
use tonic::Status;
use tower::{Layer, Service};

use crate::hooks::CallContext;
use crate::pipeline::InterceptionPipeline;

/// Layer installing an [`InterceptionPipeline`] around a gRPC service.
#[derive(Clone)]
pub struct InterceptLayer {
    pipeline: Arc<InterceptionPipeline>,
}

impl InterceptLayer {
    pub fn new(pipeline: Arc<InterceptionPipeline>) -> Self {
        Self { pipeline }
    }
}

impl<S> Layer<S> for InterceptLayer {
    type Service = InterceptService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptService {
            inner,
            pipeline: self.pipeline.clone(),
        }
    }
}

/// Service produced by [`InterceptLayer`].
#[derive(Clone)]
pub struct InterceptService<S> {
    inner: S,
    pipeline: Arc<InterceptionPipeline>,
}

impl<S> Service<http::Request<BoxBody>> for InterceptService<S>
where
    S: Service<http::Request<BoxBody>, Response = http::Response<BoxBody>>
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = S::Error;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<BoxBody>) -> Self::Future {
        let pipeline = self.pipeline.clone();
        // Tower contract: the instance that was polled ready makes the call.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let ctx = CallContext::new(request.uri().path(), request.headers());

            if let Err(status) = pipeline.pre_call(&ctx).await {
                return Ok(status_response(status));
            }

            let response = inner.call(request).await?;

            // For trailers-only responses the status is already in the
            // headers; otherwise it travels in the trailers after the body
            // and the hooks observe `Ok`.
            let code = code_from_headers(response.headers());
            pipeline.post_call(&ctx, code).await;

            Ok(response)
        })
    }
}

/// Trailers-only gRPC error response.
fn status_response(status: Status) -> http::Response<BoxBody> {
    let mut response = http::Response::new(tonic::body::empty_body());
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/grpc"),
    );
    headers.insert(
        "grpc-status",
        HeaderValue::from(status.code() as i32),
    );
    // Messages with characters a header cannot carry are dropped, not
    // mangled; the status code alone still reaches the caller.
    if let Ok(message) = HeaderValue::from_str(status.message()) {
        headers.insert("grpc-message", message);
    }
    response
}

fn code_from_headers(headers: &http::HeaderMap) -> tonic::Code {
    headers
        .get("grpc-status")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i32>().ok())
        .map(tonic::Code::from)
        .unwrap_or(tonic::Code::Ok)
}
