//! Stateless request builder and response parser for the `/todos` collection.
//!
//! # Design
//! `TodoClient` holds only a `base_url`. Each backend call is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`, so the wire format can be checked
//! without a server and any `Transport` can sit in between.

use serde::de::DeserializeOwned;

use crate::error::RemoteError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Todo};

#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        HttpRequest::new(HttpMethod::Get, format!("{}/todos", self.base_url))
    }

    /// `GET /todos?_start={offset}&_limit={limit}`
    pub fn build_list_page(&self, offset: usize, limit: usize) -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            format!("{}/todos?_start={offset}&_limit={limit}", self.base_url),
        )
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, RemoteError> {
        HttpRequest::json(HttpMethod::Post, format!("{}/todos", self.base_url), input)
    }

    /// Full replacement of the todo at `id`.
    pub fn build_update_todo(&self, id: i64, todo: &Todo) -> Result<HttpRequest, RemoteError> {
        HttpRequest::json(HttpMethod::Put, format!("{}/todos/{id}", self.base_url), todo)
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        HttpRequest::new(HttpMethod::Delete, format!("{}/todos/{id}", self.base_url))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, RemoteError> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    pub fn parse_list_page(&self, response: HttpResponse) -> Result<Vec<Todo>, RemoteError> {
        self.parse_list_todos(response)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, RemoteError> {
        check_status(&response, &[201])?;
        decode(&response.body)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, RemoteError> {
        check_status(&response, &[200])?;
        decode(&response.body)
    }

    /// json-server answers 200 with `{}`, other backends 204; the body is
    /// never read.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), RemoteError> {
        check_status(&response, &[200, 204])
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `RemoteError` variant.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), RemoteError> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(RemoteError::NotFound);
    }
    Err(RemoteError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
