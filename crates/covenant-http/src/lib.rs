//! # covenant-http
//!
//! Contract-driven routing on top of axum. Routes are registered with their
//! request and response schemas; the router builds a middleware chain per
//! route that parses, logs, validates and finally calls the handlers, and
//! compiles the registered contracts into an OpenAPI document.
//!
//! ```
//! use covenant_http::{handler, ContractRequest, ContractResponse, HandlerResult, RouteOptions, Router, RouterConfig};
//! use covenant_openapi::{RequestSchema, RouteSchema};
//! use covenant_schema::{integer, object_with_only};
//! use serde_json::json;
//!
//! async fn show(request: ContractRequest) -> HandlerResult {
//!     Ok(ContractResponse::json(json!({ "id": request.params["id"] })))
//! }
//!
//! let mut router = Router::new(RouterConfig::new());
//! router
//!     .get(
//!         RouteOptions::new("/things/:id")
//!             .schema(RouteSchema::new().request(
//!                 RequestSchema::new().params(object_with_only([("id", integer().parse())])),
//!             ))
//!             .handler(handler(show)),
//!     )
//!     .unwrap();
//! router.use_error_handler();
//!
//! assert!(router.to_openapi().paths.contains_key("/things/{id}"));
//! let app: axum::Router = router.into_axum();
//! ```

pub mod config;
pub mod error_handler;
pub mod errors;
pub mod logging;
pub mod middleware;
pub mod reporter;
pub mod request;
pub mod response;
pub mod router;
pub mod sanitizer;

pub use config::{AppEnv, ConfigError, CorrelationIdExtractor, RouterConfig};
pub use error_handler::ErrorHandler;
pub use errors::{ApiError, ErrorKind, HandlerResult, RouterError};
pub use logging::{init_logging, LoggingConfig};
pub use middleware::{
    from_fn, handler, BodyParser, CacheControl, CorrelationId, Guarded, JsonOptions, Middleware,
    NetworkLogger, Next, NextFuture, Pipeline, RequestValidator, ResponseValidator,
};
pub use reporter::{ErrorEvent, ErrorReporter, ExceptionSink, TracingSink};
pub use request::{ContractRequest, RequestSnapshot};
pub use response::{ContractResponse, ResponseBody};
pub use router::{RouteOptions, Router, SchemaRouteOptions};
pub use sanitizer::{sanitize, sanitized, SanitizeKey, MASK};
