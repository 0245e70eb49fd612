//! Domain types for the todo collection.
//!
//! # Design
//! `Todo` mirrors the backend's JSON shape (`{id, title, completed, userId}`)
//! but is defined independently of the mock-server crate; the integration
//! tests catch schema drift. `NewTodo` is a todo the backend has not seen
//! yet, and `CreateTodo` is the POST body that may carry a client-chosen id.

use serde::{Deserialize, Serialize};

/// Owner assigned when the caller does not supply one.
pub const DEFAULT_USER_ID: i64 = 1;

fn default_user_id() -> i64 {
    DEFAULT_USER_ID
}

/// A single todo item as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    #[serde(rename = "userId", default = "default_user_id")]
    pub user_id: i64,
}

impl Todo {
    /// Placeholder shown when the first fetch fails and nothing else can be
    /// displayed.
    pub fn fallback() -> Self {
        Self {
            id: 1,
            title: "Fallback Todo".to_string(),
            completed: false,
            user_id: DEFAULT_USER_ID,
        }
    }
}

/// A todo that has not been assigned an id yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "userId", default = "default_user_id")]
    pub user_id: i64,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
            user_id: DEFAULT_USER_ID,
        }
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Attach an explicit id for the POST body.
    pub fn with_id(self, id: i64) -> CreateTodo {
        CreateTodo {
            id: Some(id),
            title: self.title,
            completed: self.completed,
            user_id: self.user_id,
        }
    }
}

/// Request payload for `POST /todos`. When `id` is omitted the backend
/// assigns one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "userId", default = "default_user_id")]
    pub user_id: i64,
}

impl From<NewTodo> for CreateTodo {
    fn from(todo: NewTodo) -> Self {
        Self {
            id: None,
            title: todo.title,
            completed: todo.completed,
            user_id: todo.user_id,
        }
    }
}

/// What a form submit carries: an input with an id edits an existing todo,
/// one without creates a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Create(NewTodo),
    Update(Todo),
}

/// Which slice of the collection is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_size: u32,
    pub current_page: u32,
    pub total_pages: u32,
}

impl PageWindow {
    /// Offset of the first item on the current page.
    pub fn offset(&self) -> usize {
        crate::pagination::page_offset(self.current_page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_uses_camel_case_user_id() {
        let todo = Todo {
            id: 3,
            title: "Write tests".to_string(),
            completed: true,
            user_id: 2,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["userId"], 2);
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn todo_defaults_user_id_when_missing() {
        let todo: Todo = serde_json::from_str(r#"{"id":1,"title":"x","completed":false}"#).unwrap();
        assert_eq!(todo.user_id, DEFAULT_USER_ID);
    }

    #[test]
    fn fallback_todo_shape() {
        let json = serde_json::to_value(Todo::fallback()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "title": "Fallback Todo", "completed": false, "userId": 1})
        );
    }

    #[test]
    fn create_body_omits_missing_id() {
        let body = serde_json::to_value(CreateTodo::from(NewTodo::new("Buy milk"))).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["userId"], 1);
    }

    #[test]
    fn create_body_carries_explicit_id() {
        let body = serde_json::to_value(NewTodo::new("Buy milk").completed(true).with_id(11)).unwrap();
        assert_eq!(body["id"], 11);
        assert_eq!(body["completed"], true);
    }

    #[test]
    fn page_window_offset() {
        let window = PageWindow {
            page_size: 3,
            current_page: 4,
            total_pages: 4,
        };
        assert_eq!(window.offset(), 9);
    }
}
