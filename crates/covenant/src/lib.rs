//! # covenant
//!
//! Contract-driven routing for axum. Routes are registered together with the
//! schemas of their requests and responses; the same schemas validate
//! traffic, produce the OpenAPI document and generate the TypeScript types of
//! API clients.
//!
//! This is the umbrella package re-exporting the workspace crates.

// Re-export all sub-packages as modules
pub use covenant_http as http;
pub use covenant_openapi as openapi;
pub use covenant_schema as schema;
pub use covenant_typegen as typegen;

// Re-export common types at root level for convenience
pub use covenant_http::{
    ApiError, AppEnv, ContractRequest, ContractResponse, HandlerResult, RouteOptions, Router,
    RouterConfig, RouterError,
};
pub use covenant_openapi::{BaseProperties, OpenApiDocument, RequestSchema, RouteSchema};
pub use covenant_schema::Schema;

pub mod prelude;

/// Current version of covenant
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}
