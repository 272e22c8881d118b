use crate::store::{NewTodo, TodoChanges, TodoStore};
use covenant::prelude::*;
use covenant::schema::{iso_date, uuid};
use std::future::Future;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct TodoParams {
    id: uuid::Uuid,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    done: Option<bool>,
    limit: Option<usize>,
}

pub fn todo() -> Schema {
    named(
        "todo",
        object_with_only([
            ("id", uuid()),
            ("title", string().min(1).max(200)),
            ("done", boolean()),
            ("createdAt", iso_date().describe("Creation time")),
        ]),
    )
}

fn todo_params() -> Schema {
    object_with_only([("id", uuid())])
}

fn list_request() -> RequestSchema {
    RequestSchema::new().query(object_with_only([
        (
            "done",
            boolean().parse().optional().describe("Only todos with this completion state"),
        ),
        ("limit", integer().parse().min(1).max(100).optional()),
    ]))
}

fn create_request() -> RequestSchema {
    RequestSchema::new().body(
        object_with_only([
            ("title", string().min(1).max(200)),
            ("done", boolean().optional()),
        ])
        .named("newTodo"),
    )
}

fn update_request() -> RequestSchema {
    RequestSchema::new().params(todo_params()).body(object_with_only([
        ("title", string().min(1).max(200).optional()),
        ("done", boolean().optional()),
    ]))
}

/// Terminal handler with access to the store
fn with_store<F, Fut>(store: &TodoStore, name: &str, f: F) -> impl Middleware
where
    F: Fn(TodoStore, ContractRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let store = store.clone();
    handler(move |request| f(store.clone(), request)).named(name)
}

/// Rejects requests without `Authorization: Bearer {token}`
fn require_token(token: &str) -> impl Middleware {
    let expected = format!("Bearer {}", token);
    from_fn(move |request: ContractRequest, next: Next| {
        let authorized = request.header("authorization") == Some(expected.as_str());
        async move {
            if !authorized {
                return Err(ApiError::unauthorized("Missing or invalid token"));
            }
            next.run(request).await
        }
    })
    .named("RequireToken")
}

pub fn register(router: &mut Router, store: &TodoStore, token: &str) -> Result<(), RouterError> {
    router.get(
        RouteOptions::new("/todos")
            .operation_id("listTodos")
            .tag("Todos")
            .summary("List todos")
            .public()
            .coerce_request()
            .schema(
                RouteSchema::new()
                    .request(list_request())
                    .response(200, object_with_only([("items", array(todo()))])),
            )
            .handler(with_store(store, "listTodos", list_todos)),
    )?;

    router.post(
        RouteOptions::new("/todos")
            .operation_id("createTodo")
            .tag("Todos")
            .summary("Create a todo")
            .pre_handler(require_token(token))
            .schema(RouteSchema::new().request(create_request()).response(201, todo()))
            .handler(with_store(store, "createTodo", create_todo)),
    )?;

    router.get(
        RouteOptions::new("/todos/:id")
            .operation_id("getTodo")
            .tag("Todos")
            .summary("Fetch a todo")
            .public()
            .schema(
                RouteSchema::new()
                    .request(RequestSchema::new().params(todo_params()))
                    .response(200, todo()),
            )
            .handler(with_store(store, "getTodo", get_todo)),
    )?;

    router.patch(
        RouteOptions::new("/todos/:id")
            .operation_id("updateTodo")
            .tag("Todos")
            .summary("Update a todo")
            .pre_handler(require_token(token))
            .schema(RouteSchema::new().request(update_request()).response(200, todo()))
            .handler(with_store(store, "updateTodo", update_todo)),
    )?;

    router.delete(
        RouteOptions::new("/todos/:id")
            .operation_id("deleteTodo")
            .tag("Todos")
            .summary("Delete a todo")
            .pre_handler(require_token(token))
            .schema(RouteSchema::new().request(RequestSchema::new().params(todo_params())))
            .handler(with_store(store, "deleteTodo", delete_todo)),
    )?;

    router.schema(
        SchemaRouteOptions::new("/todos")
            .get(list_request())
            .post(create_request()),
    )?;

    Ok(())
}

async fn list_todos(store: TodoStore, request: ContractRequest) -> HandlerResult {
    let query: ListQuery = request.query_as()?;
    let items = store
        .list(query.done, query.limit.unwrap_or(DEFAULT_LIMIT))
        .await;
    Ok(ContractResponse::json(json!({ "items": items })))
}

async fn create_todo(store: TodoStore, request: ContractRequest) -> HandlerResult {
    let new: NewTodo = request.body_as()?;
    let todo = store.create(new).await;
    tracing::info!("Created todo {}", todo.id);
    Ok(ContractResponse::created(serde_json::to_value(&todo)?))
}

async fn get_todo(store: TodoStore, request: ContractRequest) -> HandlerResult {
    let TodoParams { id } = request.params_as()?;
    let todo = store
        .get(id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Todo {} not found", id)))?;
    Ok(ContractResponse::json(serde_json::to_value(&todo)?))
}

async fn update_todo(store: TodoStore, request: ContractRequest) -> HandlerResult {
    let TodoParams { id } = request.params_as()?;
    let changes: TodoChanges = request.body_as()?;
    let todo = store
        .update(id, changes)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Todo {} not found", id)))?;
    Ok(ContractResponse::json(serde_json::to_value(&todo)?))
}

async fn delete_todo(store: TodoStore, request: ContractRequest) -> HandlerResult {
    let TodoParams { id } = request.params_as()?;
    if !store.delete(id).await {
        return Err(ApiError::not_found(format!("Todo {} not found", id)));
    }
    Ok(ContractResponse::no_content())
}
