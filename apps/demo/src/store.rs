use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub done: Option<bool>,
}

/// In-memory todo storage shared by the route handlers
#[derive(Debug, Clone, Default)]
pub struct TodoStore {
    todos: Arc<RwLock<HashMap<Uuid, Todo>>>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, new: NewTodo) -> Todo {
        let todo = Todo {
            id: Uuid::new_v4(),
            title: new.title,
            done: new.done,
            created_at: Utc::now(),
        };
        self.todos.write().await.insert(todo.id, todo.clone());
        todo
    }

    /// Todos ordered by creation time, optionally filtered by completion
    pub async fn list(&self, done: Option<bool>, limit: usize) -> Vec<Todo> {
        let mut todos: Vec<Todo> = self
            .todos
            .read()
            .await
            .values()
            .filter(|todo| done.map_or(true, |done| todo.done == done))
            .cloned()
            .collect();
        todos.sort_by_key(|todo| todo.created_at);
        todos.truncate(limit);
        todos
    }

    pub async fn get(&self, id: Uuid) -> Option<Todo> {
        self.todos.read().await.get(&id).cloned()
    }

    pub async fn update(&self, id: Uuid, changes: TodoChanges) -> Option<Todo> {
        let mut todos = self.todos.write().await;
        let todo = todos.get_mut(&id)?;
        if let Some(title) = changes.title {
            todo.title = title;
        }
        if let Some(done) = changes.done {
            todo.done = done;
        }
        Some(todo.clone())
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        self.todos.write().await.remove(&id).is_some()
    }
}
