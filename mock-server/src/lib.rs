use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

fn default_user_id() -> i64 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    #[serde(rename = "userId", default = "default_user_id")]
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "userId", default = "default_user_id")]
    pub user_id: i64,
}

/// Full replacement body for `PUT /todos/{id}`. The id in the path wins over
/// any id carried in the body.
#[derive(Deserialize)]
pub struct ReplaceTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "userId", default = "default_user_id")]
    pub user_id: i64,
}

/// json-server style slicing parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "_start")]
    pub start: Option<usize>,
    #[serde(rename = "_limit")]
    pub limit: Option<usize>,
}

/// Insertion-ordered collection; the order is the stable order slices are
/// served in.
pub type Db = Arc<RwLock<Vec<Todo>>>;

pub fn new_db(todos: Vec<Todo>) -> Db {
    Arc::new(RwLock::new(todos))
}

pub fn app() -> Router {
    app_with(Vec::new())
}

pub fn app_with(todos: Vec<Todo>) -> Router {
    app_with_db(new_db(todos))
}

pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_db(listener, new_db(Vec::new())).await
}

pub async fn run_with_db(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock todo backend listening");
    }
    axum::serve(listener, app_with_db(db)).await
}

async fn list_todos(State(db): State<Db>, Query(params): Query<ListParams>) -> Json<Vec<Todo>> {
    let todos = db.read().await;
    let start = params.start.unwrap_or(0).min(todos.len());
    let end = match params.limit {
        Some(limit) => start.saturating_add(limit).min(todos.len()),
        None => todos.len(),
    };
    debug!(start, end, total = todos.len(), "list todos");
    Json(todos[start..end].to_vec())
}

async fn create_todo(
    State(db): State<Db>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), StatusCode> {
    let mut todos = db.write().await;
    let id = match input.id {
        Some(id) if todos.iter().any(|t| t.id == id) => return Err(StatusCode::CONFLICT),
        Some(id) => id,
        None => todos
            .iter()
            .map(|t| t.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(StatusCode::CONFLICT)?,
    };
    let todo = Todo {
        id,
        title: input.title,
        completed: input.completed,
        user_id: input.user_id,
    };
    todos.push(todo.clone());
    debug!(id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<i64>) -> Result<Json<Todo>, StatusCode> {
    let todos = db.read().await;
    todos
        .iter()
        .find(|t| t.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<ReplaceTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut todos = db.write().await;
    let todo = todos.iter_mut().find(|t| t.id == id).ok_or(StatusCode::NOT_FOUND)?;
    todo.title = input.title;
    todo.completed = input.completed;
    todo.user_id = input.user_id;
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<i64>) -> StatusCode {
    let mut todos = db.write().await;
    match todos.iter().position(|t| t.id == id) {
        Some(index) => {
            todos.remove(index);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_with_camel_case_user_id() {
        let todo = Todo {
            id: 7,
            title: "Test".to_string(),
            completed: false,
            user_id: 1,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["title"], "Test");
        assert_eq!(json["completed"], false);
        assert_eq!(json["userId"], 1);
    }

    #[test]
    fn create_todo_defaults() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"No extras"}"#).unwrap();
        assert_eq!(input.title, "No extras");
        assert!(input.id.is_none());
        assert!(!input.completed);
        assert_eq!(input.user_id, 1);
    }

    #[test]
    fn create_todo_accepts_explicit_id() {
        let input: CreateTodo =
            serde_json::from_str(r#"{"id":42,"title":"Done","completed":true,"userId":3}"#).unwrap();
        assert_eq!(input.id, Some(42));
        assert!(input.completed);
        assert_eq!(input.user_id, 3);
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"completed":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn replace_todo_ignores_body_id() {
        let input: ReplaceTodo =
            serde_json::from_str(r#"{"id":99,"title":"Replaced","completed":true,"userId":1}"#).unwrap();
        assert_eq!(input.title, "Replaced");
        assert!(input.completed);
    }

    #[test]
    fn list_params_use_underscore_names() {
        let params: ListParams = serde_json::from_str(r#"{"_start":3,"_limit":3}"#).unwrap();
        assert_eq!(params.start, Some(3));
        assert_eq!(params.limit, Some(3));
    }
}
