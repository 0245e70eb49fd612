//! Backend collection access.
//!
//! # Design
//! `RemoteStore` is the seam between the sync logic and the network. The
//! production implementation, `HttpRemoteStore`, pairs the stateless
//! `TodoClient` with a `Transport` that performs the round-trip, keeping the
//! request shaping in one place and the I/O in another. No retries happen
//! here: a failed call surfaces as `RemoteError` and the caller decides.

use async_trait::async_trait;
use tracing::debug;

use crate::client::TodoClient;
use crate::config::SyncConfig;
use crate::error::RemoteError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Todo};

/// List/create/update/delete over a page-addressable todo collection.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The whole collection. Only its length is used for paging.
    async fn list_all(&self) -> Result<Vec<Todo>, RemoteError>;

    /// Up to `limit` todos starting at `offset`, in the backend's stable order.
    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<Todo>, RemoteError>;

    /// Store a new todo. The backend keeps `todo.id` when present.
    async fn create(&self, todo: CreateTodo) -> Result<Todo, RemoteError>;

    /// Replace the todo at `id`.
    async fn update(&self, id: i64, todo: Todo) -> Result<Todo, RemoteError>;

    async fn delete(&self, id: i64) -> Result<(), RemoteError>;
}

/// Executes one HTTP round-trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError>;
}

/// Blocking `ureq` agent driven from tokio's blocking pool.
///
/// Status codes are returned as data rather than errors so `TodoClient`
/// owns status interpretation.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &SyncConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.request_timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute_blocking(&agent, request))
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?
    }
}

fn execute_blocking(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, RemoteError> {
    let result = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            agent.put(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
    };
    let mut response = result.map_err(|e| RemoteError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| RemoteError::Transport(e.to_string()))?;

    Ok(HttpResponse { status, headers, body })
}

/// `RemoteStore` over the json-server style REST collection at `/todos`.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore<T> {
    client: TodoClient,
    transport: T,
}

impl HttpRemoteStore<UreqTransport> {
    /// Store backed by a `ureq` agent configured from `config`.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(TodoClient::new(&config.base_url), UreqTransport::new(config))
    }
}

impl<T: Transport> HttpRemoteStore<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
        debug!(method = request.method.as_str(), path = %request.path, "remote call");
        self.transport.execute(request).await
    }
}

#[async_trait]
impl<T: Transport> RemoteStore for HttpRemoteStore<T> {
    async fn list_all(&self) -> Result<Vec<Todo>, RemoteError> {
        let response = self.send(self.client.build_list_todos()).await?;
        self.client.parse_list_todos(response)
    }

    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<Todo>, RemoteError> {
        let response = self.send(self.client.build_list_page(offset, limit)).await?;
        self.client.parse_list_page(response)
    }

    async fn create(&self, todo: CreateTodo) -> Result<Todo, RemoteError> {
        let request = self.client.build_create_todo(&todo)?;
        let response = self.send(request).await?;
        self.client.parse_create_todo(response)
    }

    async fn update(&self, id: i64, todo: Todo) -> Result<Todo, RemoteError> {
        let request = self.client.build_update_todo(id, &todo)?;
        let response = self.send(request).await?;
        self.client.parse_update_todo(response)
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        let response = self.send(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)
    }
}
