//! End-to-end tests of a mounted contract router

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use covenant_http::{
    from_fn, handler, ApiError, AppEnv, ContractRequest, ContractResponse, ErrorEvent, ErrorReporter,
    ExceptionSink, HandlerResult, JsonOptions, Middleware, Next, RouteOptions, Router, RouterConfig,
    SchemaRouteOptions,
};
use covenant_openapi::{BaseProperties, RequestSchema, RouteSchema, Tag};
use covenant_schema::{
    array, enumeration, integer, named, object_with_only, one_of, string, string_enum,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing_test::traced_test;

#[derive(Clone)]
struct UserToken(&'static str);

fn schema() -> RouteSchema {
    RouteSchema::new()
        .request(
            RequestSchema::new()
                .query(object_with_only([
                    (
                        "hello",
                        string_enum(["hi", "hello"]).describe("Different ways to greet someone"),
                    ),
                    ("world", string().min(2).max(4)),
                    ("foo", array(string()).optional()),
                ]))
                .params(object_with_only([("id", integer().parse())]))
                .body(object_with_only([(
                    "action",
                    enumeration(["create", "update"]).describe("The action you want to perform"),
                )])),
        )
        .response(
            201,
            object_with_only([
                ("id", integer()),
                (
                    "item",
                    one_of([
                        named("itemA", object_with_only([("id", integer())])),
                        named("itemB", object_with_only([("id", integer())])),
                    ])
                    .optional(),
                ),
            ]),
        )
}

fn base_properties() -> BaseProperties {
    BaseProperties::new("My api", "1.0.0")
        .tag(Tag::new("Another tag"))
        .property("host", json!("https://myapi.com"))
        .property("basePath", json!("/"))
}

fn config() -> RouterConfig {
    RouterConfig::new()
        .app_env(AppEnv::Test)
        .validate_responses(true)
        .swagger_base_properties(base_properties())
}

fn parse_id(request: &ContractRequest) -> Result<i64, ApiError> {
    Ok(request.params["id"].as_str().unwrap_or_default().parse::<i64>()?)
}

async fn generic_handler(request: ContractRequest) -> HandlerResult {
    Ok(ContractResponse::created(json!({ "id": parse_id(&request)? })))
}

async fn validating_handler(request: ContractRequest) -> HandlerResult {
    let id = parse_id(&request)?;
    match id {
        456 => Ok(ContractResponse::created(
            json!({ "id": id, "extraField": "shouldnotbehere" }),
        )),
        789 => Ok(ContractResponse::json(
            json!({ "id": id, "thiswonterror": "cos it is not validated" }),
        )),
        _ => Ok(ContractResponse::created(json!({ "id": id }))),
    }
}

async fn extra_field_handler(request: ContractRequest) -> HandlerResult {
    Ok(ContractResponse::created(
        json!({ "id": parse_id(&request)?, "extraField": "shouldnotbehere" }),
    ))
}

async fn token_handler(request: ContractRequest) -> HandlerResult {
    let token = request.extensions.get::<UserToken>().map(|t| t.0);
    Ok(ContractResponse::created(json!({ "id": token })))
}

async fn unprocessable_handler(_request: ContractRequest) -> HandlerResult {
    Err(ApiError::unprocessable_entity("Unprocessable")
        .with_errors([json!({ "path": "action", "message": "cannot be processed" })]))
}

async fn unknown_error_handler(_request: ContractRequest) -> HandlerResult {
    Err(anyhow::anyhow!("Unknown error").into())
}

async fn panicking_handler(_request: ContractRequest) -> HandlerResult {
    panic!("handler blew up");
}

async fn echo_handler(request: ContractRequest) -> HandlerResult {
    Ok(ContractResponse::json(json!({ "body": request.body })))
}

fn put_route<M: Middleware + 'static>(handler: M) -> RouteOptions {
    RouteOptions::new("/api/something/:id")
        .schema(schema())
        .handler(handler)
        .public()
        .tag("Something")
        .summary("This route is about something")
        .description("This route does something")
}

fn setup(config: RouterConfig, route: RouteOptions) -> Router {
    let mut router = Router::new(config);
    router.put(route).unwrap();
    router
        .post(
            RouteOptions::new("/api/echo")
                .handler(handler(echo_handler))
                .json_options(JsonOptions::default().limit(64)),
        )
        .unwrap();
    router.serve_swagger("/docs").unwrap();
    router.use_error_handler();
    router
}

fn put_something(id: &str, query: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/api/something/{}?{}", id, query))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value, String) {
    let response = router.into_axum().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, text)
}

fn without_stack(mut body: Value) -> Value {
    if let Some(map) = body.as_object_mut() {
        map.remove("stack");
    }
    body
}

#[tokio::test]
async fn pre_handlers_come_first() {
    let route = put_route(handler(token_handler)).pre_handler(from_fn(
        |mut request: ContractRequest, next: Next| async move {
            request.extensions.insert(UserToken("abc"));
            next.run(request).await
        },
    ));
    let router = setup(config().validate_responses(false), route);

    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": "abc" }));
}

#[tokio::test]
async fn non_json_requests_are_parsed_as_text() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let request = Request::builder()
        .method("POST")
        .uri("/api/echo")
        .header("content-type", "text/plain")
        .body(Body::from("ABC"))
        .unwrap();

    let (status, body, _) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "body": "ABC" }));
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let request = Request::builder()
        .method("POST")
        .uri("/api/echo")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "data": "x".repeat(200) }).to_string()))
        .unwrap();

    let (status, body, _) = send(router, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["status"], json!(413));
}

#[tokio::test]
#[traced_test]
async fn request_logging_disabled() {
    let router = setup(config().log_requests(false), put_route(handler(generic_handler)));
    let (status, _, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!logs_contain("request: ("));
}

#[tokio::test]
#[traced_test]
async fn request_logging_with_correlation_id() {
    let config = config()
        .log_requests(true)
        .log_responses(true)
        .correlation_id_extractor(|request: &ContractRequest| {
            request.params["id"].as_str().unwrap_or_default().to_string()
        });
    let router = setup(config, put_route(handler(generic_handler)));

    let (status, _, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(logs_contain(
        r#"request: (123) PUT /api/something/123?hello=hi&world=yes {"action":"create"}"#
    ));
    assert!(logs_contain(r#"response: (123) 201: {"id":123}"#));
}

#[tokio::test]
async fn valid_request_passes() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 123 }));
}

#[tokio::test]
async fn invalid_query_is_rejected() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let (status, body, _) = send(
        router,
        put_something("123", "world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["stack"]
        .as_str()
        .unwrap()
        .starts_with("InvalidRequestError: Invalid url query parameters"));
    assert_eq!(
        without_stack(body),
        json!({
            "status": 400,
            "message": "Invalid url query parameters",
            "errors": [
                { "path": "hello", "message": "should be a valid enum value (hi,hello)" }
            ]
        })
    );
}

#[tokio::test]
async fn invalid_params_are_rejected() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let (status, body, _) = send(
        router,
        put_something("myid123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid url path parameters"));
    assert_eq!(
        body["errors"],
        json!([{ "path": "id", "message": "should be an integer", "value": "myid123" }])
    );
}

#[tokio::test]
async fn invalid_payload_is_rejected() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "delete" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid payload"));
    assert_eq!(
        body["errors"],
        json!([{
            "path": "action",
            "message": "should be a valid enum value (create,update)",
            "value": "delete"
        }])
    );
}

#[tokio::test]
async fn warn_mode_lets_invalid_requests_through() {
    let route = put_route(handler(generic_handler)).warn_on_request_validation_error();
    let router = setup(config(), route);
    let (status, body, _) = send(
        router,
        put_something("123", "world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 123 }));
}

#[test]
fn operation_id_is_taken_from_route() {
    let router = setup(
        config(),
        put_route(handler(generic_handler)).operation_id("updateSomething"),
    );
    let document = router.to_openapi();
    let operation = document.operation("/api/something/{id}", "put").unwrap();
    assert_eq!(operation.operation_id, "updateSomething");
}

#[test]
fn operation_id_is_generated() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let document = router.to_openapi();
    let operation = document.operation("/api/something/{id}", "put").unwrap();
    assert_eq!(operation.operation_id, "/api/something/{id}/put");
}

#[tokio::test]
async fn response_mismatch_is_server_error() {
    let router = setup(config(), put_route(handler(validating_handler)));
    let (status, body, _) = send(
        router,
        put_something("456", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        without_stack(body),
        json!({
            "status": 500,
            "message": "Response body does not match the specified schema",
            "errors": [
                { "path": "extraField", "message": "should not exist", "value": "shouldnotbehere" }
            ]
        })
    );
}

#[tokio::test]
async fn unmapped_status_is_not_validated() {
    let router = setup(config(), put_route(handler(validating_handler)));
    let (status, body, _) = send(
        router,
        put_something("789", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 789, "thiswonterror": "cos it is not validated" }));
}

#[tokio::test]
async fn valid_response_passes() {
    let router = setup(config(), put_route(handler(validating_handler)));
    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 123 }));
}

#[tokio::test]
async fn disabled_response_validation_passes() {
    let router = setup(
        config().validate_responses(false),
        put_route(handler(extra_field_handler)),
    );
    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 123, "extraField": "shouldnotbehere" }));
}

#[test]
fn document_includes_components() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let document = router.to_openapi();

    assert_eq!(
        document.components.schemas.keys().collect::<Vec<_>>(),
        vec!["itemA", "itemB"]
    );
    let tags: Vec<&str> = document.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["Another tag", "Something"]);
    assert!(!document.paths.contains_key("/api/echo"));
}

#[tokio::test]
async fn serves_swagger_ui() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let request = Request::builder().uri("/docs/").body(Body::empty()).unwrap();

    let (status, _, text) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("Swagger UI"));
    assert!(text.contains("/docs/swagger.json"));
}

#[tokio::test]
async fn serves_swagger_document() {
    let router = setup(config(), put_route(handler(generic_handler)));
    let request = Request::builder()
        .uri("/docs/swagger.json")
        .body(Body::empty())
        .unwrap();

    let (status, body, _) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openapi"], json!("3.0.3"));
    assert_eq!(body["info"]["title"], json!("My api"));
    assert_eq!(body["host"], json!("https://myapi.com"));
    assert!(body["paths"]["/api/something/{id}"]["put"].is_object());
}

#[tokio::test]
async fn swagger_pre_handlers_run_first() {
    let config = config().swagger_pre_handler(from_fn(
        |request: ContractRequest, next: Next| async move {
            if request.header("authorization").is_none() {
                return Err(ApiError::unauthorized("Login required"));
            }
            next.run(request).await
        },
    ));
    let router = setup(config, put_route(handler(generic_handler)));
    let request = Request::builder()
        .uri("/docs/swagger.json")
        .body(Body::empty())
        .unwrap();

    let (status, body, _) = send(router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Login required"));
}

#[tokio::test]
async fn schema_introspection() {
    let mut router = Router::new(config());
    router
        .schema(
            SchemaRouteOptions::new("/api/things")
                .post(RequestSchema::new().body(object_with_only([("name", string())]))),
        )
        .unwrap();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/things")
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "post": {
                "body": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } },
                    "required": ["name"],
                    "additionalProperties": false
                }
            }
        })
    );
}

#[tokio::test]
async fn error_handler_keeps_http_errors() {
    let router = setup(config(), put_route(handler(unprocessable_handler)));
    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        without_stack(body),
        json!({
            "status": 422,
            "message": "Unprocessable",
            "errors": [{ "path": "action", "message": "cannot be processed" }]
        })
    );
}

#[tokio::test]
async fn error_handler_normalizes_unknown_errors() {
    let router = setup(config(), put_route(handler(unknown_error_handler)));
    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["stack"]
        .as_str()
        .unwrap()
        .starts_with("ServerError: Unknown error"));
    assert_eq!(
        without_stack(body),
        json!({ "status": 500, "message": "Unknown error", "errors": ["Unknown error"] })
    );
}

#[tokio::test]
async fn panics_become_server_errors() {
    let router = setup(config(), put_route(handler(panicking_handler)));
    let (status, body, _) = send(
        router,
        put_something("123", "hello=hi&world=yes", json!({ "action": "create" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("handler blew up"));
}

#[tokio::test]
async fn failures_without_error_handler_are_plain_500() {
    let mut router = Router::new(config());
    router
        .get(RouteOptions::new("/boom").handler(handler(unknown_error_handler)))
        .unwrap();

    let request = Request::builder().uri("/boom").body(Body::empty()).unwrap();
    let (status, _, text) = send(router, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "Internal Server Error");
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ErrorEvent>>,
}

impl ExceptionSink for RecordingSink {
    fn capture(&self, event: ErrorEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test]
async fn reported_requests_use_keys_added_after_the_reporter() {
    let sink = Arc::new(RecordingSink::default());
    let config = config()
        .error_reporter(ErrorReporter::initialize(Some(sink.clone() as Arc<dyn ExceptionSink>)))
        .sanitize_key("authorization")
        .sanitize_key("action");
    let router = setup(config, put_route(handler(unknown_error_handler)));

    let request = Request::builder()
        .method("PUT")
        .uri("/api/something/123?hello=hi&world=yes")
        .header("content-type", "application/json")
        .header("authorization", "Bearer secret")
        .body(Body::from(json!({ "action": "create" }).to_string()))
        .unwrap();
    let (status, _, _) = send(router, request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].environment, AppEnv::Test);
    let reported = events[0].request.as_ref().unwrap();
    assert_eq!(reported["headers"]["authorization"], json!("********"));
    assert_eq!(reported["data"], json!({ "action": "********" }));
}

async fn typed_id_handler(request: ContractRequest) -> HandlerResult {
    let params: HashMap<String, i64> = request.params_as()?;
    Ok(ContractResponse::json(json!({ "id": params["id"] })))
}

#[tokio::test]
async fn coerced_params_reach_typed_handlers() {
    let mut router = Router::new(config());
    router
        .get(
            RouteOptions::new("/things/:id")
                .schema(RouteSchema::new().request(
                    RequestSchema::new().params(object_with_only([("id", integer().parse())])),
                ))
                .handler(handler(typed_id_handler))
                .coerce_request(),
        )
        .unwrap();
    router.use_error_handler();

    let request = Request::builder().uri("/things/4.0").body(Body::empty()).unwrap();
    let (status, body, _) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 4 }));
}
