//! # Prelude
//!
//! Convenient imports for declaring contract routes.
//!
//! ```rust
//! use covenant::prelude::*;
//!
//! async fn ping(_request: ContractRequest) -> HandlerResult {
//!     Ok(ContractResponse::json(json!({ "pong": true })))
//! }
//!
//! let mut router = Router::new(RouterConfig::new());
//! router
//!     .get(
//!         RouteOptions::new("/ping")
//!             .schema(RouteSchema::new().response(200, object_with_only([("pong", boolean())])))
//!             .handler(handler(ping)),
//!     )
//!     .unwrap();
//! assert!(router.to_openapi().paths.contains_key("/ping"));
//! ```

// Routing and request handling
pub use covenant_http::{
    from_fn, handler, ApiError, AppEnv, ContractRequest, ContractResponse, ErrorKind,
    HandlerResult, JsonOptions, Middleware, Next, RouteOptions, Router, RouterConfig,
    RouterError, SchemaRouteOptions,
};

// Contracts and documentation
pub use covenant_openapi::{BaseProperties, RequestSchema, RouteSchema, Tag};

// Schema builders
pub use covenant_schema::{
    array, boolean, enumeration, hashmap, integer, iso_date, lazy, named, number, object,
    object_with_only, one_of, string, string_enum, Schema,
};

// JSON helper
pub use serde_json::json;

// Common derives
pub use serde::{Deserialize, Serialize};
