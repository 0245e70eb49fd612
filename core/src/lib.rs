//! Client-side synchronization for a paginated todo collection.
//!
//! # Overview
//! Keeps a locally held page of a remote `/todos` collection consistent
//! with the backend while create/update/delete stay responsive. The
//! presentation layer renders `SyncController::snapshot()` and feeds user
//! intents back through `SyncController::dispatch`.
//!
//! # Design
//! - `RemoteStore` is the network seam. `HttpRemoteStore` builds requests
//!   with the stateless `TodoClient` (host-does-IO) and hands them to a
//!   `Transport`; `MemoryStore` stands in for the backend in tests.
//! - `pagination` is pure arithmetic over a fixed page size.
//! - `MutationPipeline` owns the per-operation ordering: confirm-then-apply
//!   for create and update, optimistic-then-rollback for delete.
//! - `SyncController` owns all displayed state; nothing else mutates it.
//! - Failures end in an outcome value and a `tracing` event; nothing is
//!   retried automatically.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod memory;
pub mod pagination;
pub mod pipeline;
pub mod sequence;
pub mod store;
pub mod types;

pub use client::TodoClient;
pub use config::SyncConfig;
pub use controller::{Command, CommandOutcome, SyncController, SyncPhase, SyncSnapshot};
pub use error::{RejectReason, RemoteError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use memory::{MemoryStore, StoreOp};
pub use pagination::{clamp, compute_bounds, parse_page, PAGE_SIZE};
pub use pipeline::{FetchOutcome, MutationOutcome, MutationPipeline};
pub use store::{HttpRemoteStore, RemoteStore, Transport, UreqTransport};
pub use types::{CreateTodo, NewTodo, PageWindow, Submission, Todo};
