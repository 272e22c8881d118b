//! # Middleware
//!
//! Middleware with the `handle(request, next)` pattern. A route's chain is a
//! [`Pipeline`]: every entry either answers the request itself or calls
//! [`Next::run`] to hand it to the following entry. Handlers are simply the
//! last entries of the chain.
//!
//! ```
//! use covenant_http::{from_fn, handler, ApiError, ContractRequest, ContractResponse, HandlerResult, Next, Pipeline};
//! use axum::http::Method;
//! use serde_json::json;
//!
//! async fn hello(_request: ContractRequest) -> HandlerResult {
//!     Ok(ContractResponse::json(json!({ "hello": "world" })))
//! }
//!
//! let pipeline = Pipeline::new()
//!     .add(from_fn(|request: ContractRequest, next: Next| async move {
//!         let response = next.run(request).await?;
//!         Ok::<_, ApiError>(response.header("x-powered-by", "covenant"))
//!     }))
//!     .add(handler(hello));
//!
//! # tokio_test::block_on(async {
//! let request = ContractRequest::new(Method::GET, "/hello".parse().unwrap());
//! let response = pipeline.execute(request).await.unwrap();
//! assert_eq!(response.headers.get("x-powered-by").unwrap(), "covenant");
//! # });
//! ```

use crate::errors::{ApiError, HandlerResult};
use crate::request::ContractRequest;
use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

pub mod body_parser;
pub mod cache_control;
pub mod network_logger;
pub mod request_validator;
pub mod response_validator;

pub use body_parser::{BodyParser, JsonOptions};
pub use cache_control::CacheControl;
pub use network_logger::{CorrelationId, NetworkLogger};
pub use request_validator::RequestValidator;
pub use response_validator::ResponseValidator;

/// Type alias for boxed future in Next
pub type NextFuture<'a> = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>>;

/// Middleware with the `handle(request, next)` pattern
pub trait Middleware: Send + Sync {
    /// Handle the request and call the next middleware in the chain
    fn handle(&self, request: ContractRequest, next: Next) -> NextFuture<'static>;

    /// Name used in logs and failure reports
    fn name(&self) -> &str {
        "Middleware"
    }
}

/// Next represents the rest of the middleware chain
pub struct Next {
    stack: Arc<Vec<Arc<dyn Middleware>>>,
    position: usize,
}

impl Next {
    fn new(stack: Arc<Vec<Arc<dyn Middleware>>>, position: usize) -> Self {
        Self { stack, position }
    }

    /// Run the rest of the middleware chain with the given request
    pub async fn run(self, request: ContractRequest) -> HandlerResult {
        match self.stack.get(self.position).cloned() {
            Some(middleware) => {
                let next = Next::new(self.stack, self.position + 1);
                middleware.handle(request, next).await
            }
            None => Err(ApiError::not_found(format!(
                "Cannot {} {}",
                request.method,
                request.path()
            ))),
        }
    }
}

/// Ordered middleware chain of one route
#[derive(Clone, Default)]
pub struct Pipeline {
    stack: Arc<Vec<Arc<dyn Middleware>>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("middleware", &self.names()).finish()
    }
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Add middleware to the pipeline
    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.add_mut(Arc::new(middleware));
        self
    }

    /// Add shared middleware to the pipeline (mutable version)
    pub fn add_mut(&mut self, middleware: Arc<dyn Middleware>) {
        Arc::make_mut(&mut self.stack).push(middleware);
    }

    /// Execute the chain for a request
    pub async fn execute(&self, request: ContractRequest) -> HandlerResult {
        Next::new(self.stack.clone(), 0).run(request).await
    }

    /// Number of entries in the chain
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Names of the entries, in execution order
    pub fn names(&self) -> Vec<&str> {
        self.stack.iter().map(|m| m.name()).collect()
    }
}

/// Turns a panic inside the wrapped entry into an unexpected failure
pub struct Guarded {
    inner: Arc<dyn Middleware>,
}

impl Guarded {
    pub fn new(inner: Arc<dyn Middleware>) -> Self {
        Self { inner }
    }
}

impl Middleware for Guarded {
    fn handle(&self, request: ContractRequest, next: Next) -> NextFuture<'static> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let name = inner.name().to_string();
            let outcome = AssertUnwindSafe(async move { inner.handle(request, next).await })
                .catch_unwind()
                .await;

            outcome.unwrap_or_else(|panic| {
                let message = panic_message(panic.as_ref());
                tracing::error!("Middleware {} panicked: {}", name, message);
                Err(ApiError::unexpected(message))
            })
        })
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::new()
    }
}

/// Terminal handler built from an async function of the request
pub struct HandlerFn<F> {
    f: F,
    name: String,
}

impl<F> HandlerFn<F> {
    /// Override the name reported for this handler
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F, Fut> Middleware for HandlerFn<F>
where
    F: Fn(ContractRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, request: ContractRequest, _next: Next) -> NextFuture<'static> {
        Box::pin((self.f)(request))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap an async function of the request as a terminal handler
pub fn handler<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(ContractRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn {
        f,
        name: std::any::type_name::<F>().to_string(),
    }
}

/// Middleware built from an async function of the request and the chain
pub struct MiddlewareFn<F> {
    f: F,
    name: String,
}

impl<F> MiddlewareFn<F> {
    /// Override the name reported for this middleware
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(ContractRequest, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, request: ContractRequest, next: Next) -> NextFuture<'static> {
        Box::pin((self.f)(request, next))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap an async function of the request and the chain as middleware
pub fn from_fn<F, Fut>(f: F) -> MiddlewareFn<F>
where
    F: Fn(ContractRequest, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    MiddlewareFn {
        f,
        name: std::any::type_name::<F>().to_string(),
    }
}
