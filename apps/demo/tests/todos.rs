use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use covenant::{AppEnv, RouterConfig};
use covenant_demo::{base_properties, mount, mount_with, store::TodoStore};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

const TOKEN: &str = "secret";

fn app() -> axum::Router {
    let config = RouterConfig::new()
        .app_env(AppEnv::Test)
        .validate_responses(true)
        .swagger_base_properties(base_properties());
    mount_with(config, TodoStore::new(), TOKEN).unwrap().into_axum()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn create_requires_token() {
    let app = app();
    let (status, body) = send(
        &app,
        json_request("POST", "/todos", json!({ "title": "Write docs" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Missing or invalid token"));
}

#[tokio::test]
async fn todo_lifecycle() {
    let app = app();

    let (status, created) = send(
        &app,
        json_request("POST", "/todos", json!({ "title": "Write docs" }), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], json!("Write docs"));
    assert_eq!(created["done"], json!(false));
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&app, get(&format!("/todos/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        json_request("PATCH", &format!("/todos/{}", id), json!({ "done": true }), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["done"], json!(true));

    let (status, listed) = send(&app, get("/todos?done=true&limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let (status, listed) = send(&app, get("/todos?done=false")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["items"], json!([]));

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/todos/{}", id))
        .header("authorization", format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, missing) = send(&app, get(&format!("/todos/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["message"], json!(format!("Todo {} not found", id)));
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let app = app();

    let (status, body) = send(&app, get("/todos/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid url path parameters"));
    assert_eq!(body["errors"][0]["path"], json!("id"));

    let (status, body) = send(&app, get("/todos?limit=500")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["path"], json!("limit"));

    let (status, body) = send(
        &app,
        json_request("POST", "/todos", json!({ "title": "" }), Some(TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid payload"));
}

#[tokio::test]
async fn schema_introspection_and_docs() {
    let app = app();

    let options = Request::builder()
        .method("OPTIONS")
        .uri("/todos")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, options).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["body"]["required"], json!(["title"]));
    assert_eq!(body["get"]["query"]["properties"]["limit"]["maximum"], json!(100));

    let (status, document) = send(&app, get("/docs/swagger.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(document["info"]["title"], json!("Todo API"));
    assert!(document["components"]["schemas"]["todo"].is_object());
    assert!(document["components"]["schemas"]["newTodo"].is_object());
}

#[test]
fn operation_ids_are_stable() {
    let document = mount().unwrap().to_openapi();
    let ids: Vec<&str> = document
        .paths
        .values()
        .flat_map(|item| item.values())
        .map(|operation| operation.operation_id.as_str())
        .collect();
    assert_eq!(ids, vec!["listTodos", "createTodo", "getTodo", "deleteTodo", "updateTodo"]);
}
