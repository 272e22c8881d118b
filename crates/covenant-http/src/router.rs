//! Contract router
//!
//! [`Router`] records every route with its schema and mounts a per-route
//! middleware chain on an axum router. The chain always has the same shape:
//!
//! 1. body parser
//! 2. network logger, when request logging is enabled
//! 3. pre-handlers, in order
//! 4. request validator, when a request schema is declared
//! 5. response validator, when response validation is enabled and responses
//!    are declared
//! 6. handlers, in order
//!
//! Every entry is wrapped in [`Guarded`], so a panic becomes a failure that
//! reaches the error handler like any other.

use crate::config::RouterConfig;
use crate::error_handler::ErrorHandler;
use crate::errors::{ApiError, RouterError};
use crate::middleware::{
    BodyParser, Guarded, JsonOptions, Middleware, Next, NextFuture, NetworkLogger, Pipeline,
    RequestValidator, ResponseValidator,
};
use crate::request::ContractRequest;
use crate::response::ContractResponse;
use axum::extract::{Path, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodFilter};
use covenant_openapi::{
    compile, HttpMethod, OpenApiDocument, RequestSchema, RouteDefinitions, RouteRecord,
    RouteSchema, SwaggerUiConfig,
};
use covenant_schema::{Schema, SchemaKind};
use http_body_util::LengthLimitError;
use once_cell::sync::OnceCell;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Everything needed to register one route
#[derive(Clone, Default)]
pub struct RouteOptions {
    pub url: String,
    pub operation_id: Option<String>,
    pub pre_handlers: Vec<Arc<dyn Middleware>>,
    pub handlers: Vec<Arc<dyn Middleware>>,
    pub schema: Option<RouteSchema>,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Log request mismatches instead of rejecting the request
    pub warn_on_request_validation_error: bool,
    /// Replace params and query values with their coerced form
    pub coerce_request: bool,
    pub json_options: JsonOptions,
}

impl RouteOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Add middleware that runs before request validation
    pub fn pre_handler<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.pre_handlers.push(Arc::new(middleware));
        self
    }

    /// Add a handler; handlers run last, in the order they were added
    pub fn handler<M: Middleware + 'static>(mut self, handler: M) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn schema(mut self, schema: RouteSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Mark the route as not requiring authentication
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn warn_on_request_validation_error(mut self) -> Self {
        self.warn_on_request_validation_error = true;
        self
    }

    pub fn coerce_request(mut self) -> Self {
        self.coerce_request = true;
        self
    }

    pub fn json_options(mut self, options: JsonOptions) -> Self {
        self.json_options = options;
        self
    }
}

/// Request schemas served by an `OPTIONS` introspection route
#[derive(Debug, Clone, Default)]
pub struct SchemaRouteOptions {
    pub url: String,
    pub methods: BTreeMap<HttpMethod, RequestSchema>,
}

impl SchemaRouteOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            methods: BTreeMap::new(),
        }
    }

    pub fn get(mut self, schema: RequestSchema) -> Self {
        self.methods.insert(HttpMethod::Get, schema);
        self
    }

    pub fn post(mut self, schema: RequestSchema) -> Self {
        self.methods.insert(HttpMethod::Post, schema);
        self
    }

    pub fn put(mut self, schema: RequestSchema) -> Self {
        self.methods.insert(HttpMethod::Put, schema);
        self
    }

    /// The body served by the introspection route.
    ///
    /// Deferred (recursive) children are described once under a top-level
    /// `definitions` key and referenced as `#/definitions/<name>`.
    pub fn describe(&self) -> Value {
        let mut body = Map::new();
        let mut definitions = Map::new();
        for (method, request) in &self.methods {
            let mut parts = Map::new();
            let schemas = [
                ("params", &request.params),
                ("query", &request.query),
                ("body", &request.body),
            ];
            for (key, schema) in schemas {
                if let Some(schema) = schema {
                    parts.insert(key.to_string(), describe_schema(schema, &mut definitions));
                }
            }
            body.insert(method.as_str().to_string(), Value::Object(parts));
        }
        if !definitions.is_empty() {
            body.insert("definitions".to_string(), Value::Object(definitions));
        }
        Value::Object(body)
    }
}

fn describe_schema(schema: &Schema, definitions: &mut Map<String, Value>) -> Value {
    schema.to_json_schema_with(&mut |child: &Schema| match (child.kind(), child.name()) {
        (SchemaKind::Lazy(_), Some(name)) => {
            if !definitions.contains_key(name) {
                definitions.insert(name.to_string(), Value::Null);
                let described = describe_schema(child, definitions);
                definitions.insert(name.to_string(), described);
            }
            json!({ "$ref": format!("#/definitions/{}", name) })
        }
        _ => describe_schema(child, definitions),
    })
}

/// Terminal entry answering with a fixed response
struct Respond {
    response: ContractResponse,
    name: &'static str,
}

impl Middleware for Respond {
    fn handle(&self, _request: ContractRequest, _next: Next) -> NextFuture<'static> {
        let response = self.response.clone();
        Box::pin(async move { Ok(response) })
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// A chain mounted on the axum router
struct MountedRoute {
    pipeline: Pipeline,
    body_limit: usize,
    error_handler: Arc<OnceCell<ErrorHandler>>,
    capture_requests: bool,
}

impl MountedRoute {
    async fn dispatch(&self, params: HashMap<String, String>, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let mut contract = ContractRequest::new(parts.method, parts.uri).with_params(params);
        contract.headers = parts.headers;
        contract.extensions = parts.extensions;
        match axum::body::to_bytes(body, self.body_limit).await {
            Ok(bytes) => contract.raw_body = bytes,
            Err(error) => contract.body_error = Some(body_read_error(error)),
        }

        let snapshot = self.capture_requests.then(|| contract.snapshot());
        match self.pipeline.execute(contract).await {
            Ok(response) => response.into_response(),
            Err(error) => match self.error_handler.get() {
                Some(handler) => handler.handle(error, snapshot.as_ref()).into_response(),
                None => {
                    tracing::error!("Unhandled error without an error handler: {}", error);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
                }
            },
        }
    }
}

fn body_read_error(error: axum::Error) -> ApiError {
    let source = error.into_inner();
    if source.downcast_ref::<LengthLimitError>().is_some() {
        ApiError::payload_too_large("request entity too large")
    } else {
        ApiError::invalid_request(format!("Failed to read request body: {}", source))
    }
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Options => MethodFilter::OPTIONS,
        HttpMethod::Head => MethodFilter::HEAD,
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Patch => MethodFilter::PATCH,
    }
}

/// Contract-driven router
pub struct Router {
    config: RouterConfig,
    app: axum::Router,
    definitions: RouteDefinitions,
    mounted: HashSet<(HttpMethod, String)>,
    pipelines: HashMap<(HttpMethod, String), Pipeline>,
    error_handler: Arc<OnceCell<ErrorHandler>>,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            app: axum::Router::new(),
            definitions: RouteDefinitions::new(),
            mounted: HashSet::new(),
            pipelines: HashMap::new(),
            error_handler: Arc::new(OnceCell::new()),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Routes recorded so far
    pub fn definitions(&self) -> &RouteDefinitions {
        &self.definitions
    }

    /// The chain mounted for a route
    pub fn pipeline(&self, method: HttpMethod, url: &str) -> Option<&Pipeline> {
        self.pipelines.get(&(method, url.to_string()))
    }

    /// Register a route
    pub fn register(&mut self, method: HttpMethod, options: RouteOptions) -> Result<(), RouterError> {
        let RouteOptions {
            url,
            operation_id,
            pre_handlers,
            handlers,
            schema,
            is_public,
            tags,
            summary,
            description,
            deprecated,
            warn_on_request_validation_error,
            coerce_request,
            json_options,
        } = options;

        self.reserve(method, &url)?;

        let schema = schema.map(Arc::new);
        let record = RouteRecord {
            url: url.clone(),
            operation_id,
            schema: schema.clone(),
            is_public,
            tags,
            summary,
            description,
            deprecated,
        };
        self.definitions
            .try_insert(method, record)
            .map_err(|record| RouterError::duplicate_route(method, record.url))?;

        let mut chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(BodyParser::new(json_options))];

        if self.config.should_log_requests() {
            chain.push(Arc::new(NetworkLogger::new(
                self.config.correlation_id_extractor.clone(),
                self.config.should_log_responses(),
            )));
        }

        chain.extend(pre_handlers);

        if let Some(request) = schema.as_ref().and_then(|s| s.request.clone()) {
            chain.push(Arc::new(
                RequestValidator::new(Arc::new(request))
                    .warn_only(warn_on_request_validation_error)
                    .coerce(coerce_request),
            ));
        }

        if self.config.validate_responses {
            if let Some(responses) = schema.as_ref().and_then(|s| s.responses.clone()) {
                chain.push(Arc::new(ResponseValidator::new(Arc::new(responses))));
            }
        }

        chain.extend(handlers);

        let pipeline = guarded(chain);
        tracing::debug!("Registered {} {} with chain {:?}", method, url, pipeline.names());
        self.mount(method, &url, pipeline, json_options.limit);
        Ok(())
    }

    pub fn options(&mut self, options: RouteOptions) -> Result<(), RouterError> {
        self.register(HttpMethod::Options, options)
    }

    pub fn head(&mut self, options: RouteOptions) -> Result<(), RouterError> {
        self.register(HttpMethod::Head, options)
    }

    pub fn get(&mut self, options: RouteOptions) -> Result<(), RouterError> {
        self.register(HttpMethod::Get, options)
    }

    pub fn post(&mut self, options: RouteOptions) -> Result<(), RouterError> {
        self.register(HttpMethod::Post, options)
    }

    pub fn put(&mut self, options: RouteOptions) -> Result<(), RouterError> {
        self.register(HttpMethod::Put, options)
    }

    pub fn delete(&mut self, options: RouteOptions) -> Result<(), RouterError> {
        self.register(HttpMethod::Delete, options)
    }

    pub fn patch(&mut self, options: RouteOptions) -> Result<(), RouterError> {
        self.register(HttpMethod::Patch, options)
    }

    /// Serve the request schemas of `url` on `OPTIONS url`
    pub fn schema(&mut self, options: SchemaRouteOptions) -> Result<(), RouterError> {
        self.reserve(HttpMethod::Options, &options.url)?;

        let pipeline = Pipeline::new().add(Guarded::new(Arc::new(Respond {
            response: ContractResponse::json(options.describe()),
            name: "SchemaIntrospection",
        })));
        self.mount(HttpMethod::Options, &options.url, pipeline, JsonOptions::default().limit);
        Ok(())
    }

    /// Compile the OpenAPI document of every route registered so far
    pub fn to_openapi(&self) -> OpenApiDocument {
        compile(&self.definitions, &self.config.swagger_base_properties)
    }

    /// Serve the OpenAPI document at `{path}/swagger.json` and the Swagger UI
    /// at `{path}`. The document is a snapshot of the routes registered so far.
    pub fn serve_swagger(&mut self, path: &str) -> Result<(), RouterError> {
        if !path.starts_with('/') {
            return Err(RouterError::invalid_path(path));
        }
        let base = path.trim_end_matches('/');
        let spec_url = format!("{}/swagger.json", base);

        let document = serde_json::to_value(self.to_openapi())?;
        let mut ui = SwaggerUiConfig::new(spec_url.clone());
        if let Some(info) = &self.config.swagger_base_properties.info {
            ui = ui.title(info.title.clone());
        }
        let page = ContractResponse::html(ui.index_html());

        let mut routes = vec![(spec_url, ContractResponse::json(document), "SwaggerDocument")];
        if base.is_empty() {
            routes.push(("/".to_string(), page, "SwaggerUi"));
        } else {
            routes.push((base.to_string(), page.clone(), "SwaggerUi"));
            routes.push((format!("{}/", base), page, "SwaggerUi"));
        }

        for (url, response, name) in routes {
            self.reserve(HttpMethod::Get, &url)?;
            let mut chain = self.config.swagger_pre_handlers.clone();
            chain.push(Arc::new(Respond { response, name }));
            self.mount(HttpMethod::Get, &url, guarded(chain), JsonOptions::default().limit);
        }

        tracing::info!("Serving API documentation at {}", path);
        Ok(())
    }

    /// Install the terminal error handler
    pub fn use_error_handler(&mut self) {
        let handler = ErrorHandler::new(&self.config);
        if self.error_handler.set(handler).is_err() {
            tracing::debug!("Error handler already installed");
        }
    }

    /// The axum router serving every mounted route
    pub fn into_axum(self) -> axum::Router {
        self.app
    }

    fn reserve(&mut self, method: HttpMethod, url: &str) -> Result<(), RouterError> {
        if !url.starts_with('/') {
            return Err(RouterError::invalid_path(url));
        }
        if !self.mounted.insert((method, url.to_string())) {
            return Err(RouterError::duplicate_route(method, url));
        }
        Ok(())
    }

    fn mount(&mut self, method: HttpMethod, url: &str, pipeline: Pipeline, body_limit: usize) {
        self.pipelines.insert((method, url.to_string()), pipeline.clone());

        let route = Arc::new(MountedRoute {
            pipeline,
            body_limit,
            error_handler: self.error_handler.clone(),
            capture_requests: self.config.error_reporter.is_active(),
        });
        let endpoint = move |params: Option<Path<HashMap<String, String>>>, request: Request| {
            let route = route.clone();
            async move {
                let params = params.map(|Path(params)| params).unwrap_or_default();
                route.dispatch(params, request).await
            }
        };

        let app = std::mem::take(&mut self.app);
        self.app = app.route(url, on(method_filter(method), endpoint));
    }
}

fn guarded(chain: Vec<Arc<dyn Middleware>>) -> Pipeline {
    let mut pipeline = Pipeline::new();
    for entry in chain {
        pipeline.add_mut(Arc::new(Guarded::new(entry)));
    }
    pipeline
}
