/*!
# covenant-openapi

OpenAPI 3.0.3 compilation for contract routes.

Routes recorded in a [`RouteDefinitions`] table carry request and response
schemas. The compiler turns the table into an [`OpenApiDocument`], sharing
every named sub-schema through `components.schemas`.

## Usage

```rust
use covenant_openapi::{compile, BaseProperties, HttpMethod, RouteDefinitions, RouteRecord, RouteSchema};
use covenant_schema::{object, uuid};
use std::sync::Arc;

let mut routes = RouteDefinitions::new();
let record = RouteRecord {
    schema: Some(Arc::new(RouteSchema::new().response(200, object([("id", uuid())]).named("thing")))),
    ..RouteRecord::new("/things/:id")
};
routes.try_insert(HttpMethod::Get, record).unwrap();

let document = compile(&routes, &BaseProperties::new("Things", "1.0.0"));
assert!(document.components.schemas.contains_key("thing"));
assert!(document.paths.contains_key("/things/{id}"));
```
*/

// Re-export main types
pub use crate::{
    error::{OpenApiError, OpenApiResult},
    generator::{compile, DefinitionTable, OpenApiGenerator},
    routes::{HttpMethod, RequestSchema, RouteDefinitions, RouteRecord, RouteSchema},
    specification::{ApiInfo, BaseProperties, OpenApiDocument, Tag},
    swagger::SwaggerUiConfig,
    validation::DocumentIssue,
};

// Core modules
pub mod error;
pub mod generator;
pub mod routes;
pub mod specification;

// Export and checks
pub mod export;
pub mod validation;

// Interactive documentation
pub mod swagger;
