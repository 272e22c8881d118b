use covenant::http::{init_logging, ErrorReporter, ExceptionSink, LoggingConfig, TracingSink};
use covenant::RouterConfig;
use covenant_demo::{base_properties, mount_with, store::TodoStore, DEFAULT_TOKEN, TOKEN_VAR};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RouterConfig::from_env()?;
    init_logging(LoggingConfig::for_env(config.app_env).with_service("covenant-demo"))
        .map_err(|error| anyhow::anyhow!("Could not initialize logging: {}", error))?;

    let config = config
        .swagger_base_properties(base_properties())
        .sanitize_key("authorization")
        .sanitize_key("password")
        .error_reporter(ErrorReporter::initialize(Some(
            Arc::new(TracingSink) as Arc<dyn ExceptionSink>
        )));

    let token = std::env::var(TOKEN_VAR).unwrap_or_else(|_| DEFAULT_TOKEN.to_string());
    let app = mount_with(config, TodoStore::new(), &token)?.into_axum();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let address = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("Server running on http://{}", address);
    tracing::info!("OpenAPI docs at http://{}/docs", address);
    axum::serve(listener, app).await?;

    Ok(())
}
