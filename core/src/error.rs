//! Error types for the sync layer.
//!
//! # Design
//! Every backend failure is a `RemoteError`. The variants only record what
//! went wrong for diagnostics; callers never branch on transient versus
//! permanent, and nothing in the crate retries. `NotFound` stays separate
//! from `HttpError` so logs read clearly when a todo vanished underneath us.

use thiserror::Error;

/// Any network or backend failure.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The backend returned 404.
    #[error("resource not found")]
    NotFound,

    /// The backend returned a status the call did not expect.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Why a mutation was refused without writing to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("delete requested without a todo id")]
    MissingId,

    #[error("todo title is empty")]
    EmptyTitle,

    /// The highest existing id leaves no room for a successor.
    #[error("no id left after the highest existing one")]
    IdExhausted,
}
