//! HTTP requests and responses as plain data.
//!
//! # Design
//! `TodoClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network; a `Transport` performs the round-trip in
//! between. The split keeps request shaping and status handling testable
//! without a server.

use crate::error::RemoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// `path` is the full URL, query string included.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// A request with no body and no headers.
    pub fn new(method: HttpMethod, path: String) -> Self {
        Self {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A request carrying `payload` as a JSON body.
    pub fn json<T: serde::Serialize>(method: HttpMethod, path: String, payload: &T) -> Result<Self, RemoteError> {
        let body = serde_json::to_string(payload).map_err(|e| RemoteError::SerializationError(e.to_string()))?;
        Ok(Self {
            method,
            path,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_request_sets_content_type() {
        let req = HttpRequest::json(HttpMethod::Post, "http://x/todos".to_string(), &[1, 2]).unwrap();
        assert_eq!(req.body.as_deref(), Some("[1,2]"));
        assert_eq!(req.headers[0].1, "application/json");
    }

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }
}
