//! Todo API served through contract routes

pub mod routes;
pub mod store;

use covenant::prelude::*;
use store::TodoStore;

/// Environment variable holding the bearer token of write routes
pub const TOKEN_VAR: &str = "DEMO_API_TOKEN";
pub const DEFAULT_TOKEN: &str = "demo-token";

pub fn base_properties() -> BaseProperties {
    BaseProperties::new("Todo API", env!("CARGO_PKG_VERSION"))
        .tag(Tag::new("Todos"))
        .property("servers", json!([{ "url": "http://localhost:8080" }]))
}

/// Routes with default settings, as used by the type generator
pub fn mount() -> Result<Router, RouterError> {
    mount_with(
        RouterConfig::new().swagger_base_properties(base_properties()),
        TodoStore::new(),
        DEFAULT_TOKEN,
    )
}

pub fn mount_with(config: RouterConfig, store: TodoStore, token: &str) -> Result<Router, RouterError> {
    let mut router = Router::new(config);
    routes::register(&mut router, &store, token)?;
    router.serve_swagger("/docs")?;
    router.use_error_handler();
    Ok(router)
}
