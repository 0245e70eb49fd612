//! Create, update and delete against the backend while keeping the
//! displayed page consistent.
//!
//! # Ordering
//! Create and update are confirm-before-apply: nothing local changes until
//! the backend has answered. Delete is optimistic: the row disappears from
//! the page before the request goes out, and a failed request is undone by
//! re-reading the current page.
//!
//! The pipeline never touches controller state directly. It goes through
//! `LocalPage`, which the controller implements.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{RejectReason, RemoteError};
use crate::pagination::{clamp, compute_bounds};
use crate::sequence::{RequestSequencer, Target};
use crate::store::RemoteStore;
use crate::types::{NewTodo, Todo};

/// How a mutation ended. Failures are values, never panics or `Err`s, so
/// the presentation layer can show a notification and carry on.
#[derive(Debug, Clone)]
pub enum MutationOutcome {
    Applied,
    /// A newer request for the same todo completed first; this result was
    /// dropped.
    Superseded,
    Rejected(RejectReason),
    Failed(RemoteError),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied)
    }
}

/// How a page read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The slice and page count were replaced with fresh data.
    Ready,
    /// The read failed with nothing on screen; the placeholder is shown.
    Degraded,
    /// The read failed and the previous data stays on screen.
    Stale,
    /// A newer page read completed first; this result was dropped.
    Superseded,
}

/// The controller-side view the pipeline mutates.
#[async_trait]
pub trait LocalPage: Send + Sync {
    fn enter_loading(&self);
    fn exit_loading(&self);

    fn current_page(&self) -> u32;
    fn set_total_pages(&self, total_pages: u32);

    /// Drop `id` from the displayed slice, returning it if it was there.
    fn remove_local(&self, id: i64) -> Option<Todo>;
    /// Swap the displayed entry with the same id for `todo`.
    fn replace_local(&self, todo: Todo);
    fn clear_editing(&self);

    /// Move to `page` and read it.
    async fn navigate(&self, page: u32) -> FetchOutcome;
    /// Re-read `page` without moving.
    async fn refetch(&self, page: u32) -> FetchOutcome;
}

/// Holds the loading flag up for as long as it lives.
pub struct LoadingGuard<'a, V: LocalPage + ?Sized> {
    view: &'a V,
}

impl<'a, V: LocalPage + ?Sized> LoadingGuard<'a, V> {
    pub fn enter(view: &'a V) -> Self {
        view.enter_loading();
        Self { view }
    }
}

impl<V: LocalPage + ?Sized> Drop for LoadingGuard<'_, V> {
    fn drop(&mut self) {
        self.view.exit_loading();
    }
}

/// Id for a new todo: one past the highest id seen, or `now_millis` when the
/// collection is empty. Gaps or concurrent writers are not accounted for.
/// `None` when the highest id is already `i64::MAX`.
pub fn next_todo_id(existing: &[Todo], now_millis: i64) -> Option<i64> {
    match existing.iter().map(|t| t.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(now_millis),
    }
}

pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

pub struct MutationPipeline<S> {
    store: Arc<S>,
    page_size: u32,
    writes: Mutex<RequestSequencer>,
    clock: fn() -> i64,
}

impl<S: RemoteStore> MutationPipeline<S> {
    pub fn new(store: Arc<S>, page_size: u32) -> Self {
        Self {
            store,
            page_size,
            writes: Mutex::new(RequestSequencer::new()),
            clock: unix_millis,
        }
    }

    /// Replace the wall clock used for the empty-collection id fallback.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Read every id to pick the next one, create with that id, then jump
    /// to page 1 so the new row is visible.
    pub async fn create<V: LocalPage + ?Sized>(&self, view: &V, draft: NewTodo) -> MutationOutcome {
        if draft.title.trim().is_empty() {
            return MutationOutcome::Rejected(RejectReason::EmptyTitle);
        }
        let _loading = LoadingGuard::enter(view);

        let existing = match self.store.list_all().await {
            Ok(todos) => todos,
            Err(error) => {
                warn!(%error, "create aborted: could not read existing ids");
                return MutationOutcome::Failed(error);
            }
        };
        let Some(id) = next_todo_id(&existing, (self.clock)()) else {
            warn!(existing = existing.len(), "create rejected: id space exhausted");
            return MutationOutcome::Rejected(RejectReason::IdExhausted);
        };
        debug!(id, existing = existing.len(), "creating todo");

        if let Err(error) = self.store.create(draft.with_id(id)).await {
            warn!(%error, id, "create failed");
            return MutationOutcome::Failed(error);
        }
        info!(id, "todo created");

        view.navigate(1).await;
        MutationOutcome::Applied
    }

    /// Send the full record, then patch the displayed row in place.
    pub async fn update<V: LocalPage + ?Sized>(&self, view: &V, todo: Todo) -> MutationOutcome {
        if todo.title.trim().is_empty() {
            return MutationOutcome::Rejected(RejectReason::EmptyTitle);
        }
        let _loading = LoadingGuard::enter(view);
        let ticket = self.writes.lock().issue(Target::Todo(todo.id));

        match self.store.update(todo.id, todo.clone()).await {
            Ok(_) => {
                if !self.writes.lock().complete(ticket) {
                    debug!(id = todo.id, seq = ticket.seq(), "dropping superseded update response");
                    return MutationOutcome::Superseded;
                }
                info!(id = todo.id, "todo updated");
                view.replace_local(todo);
                view.clear_editing();
                MutationOutcome::Applied
            }
            Err(error) => {
                self.writes.lock().abandon(ticket);
                warn!(%error, id = todo.id, "update failed");
                MutationOutcome::Failed(error)
            }
        }
    }

    /// Remove the row first, then ask the backend. On success the page
    /// count is re-derived and the view steps back if its page vanished; on
    /// failure the current page is re-read, which restores the row.
    pub async fn delete<V: LocalPage + ?Sized>(&self, view: &V, id: Option<i64>) -> MutationOutcome {
        let Some(id) = id else {
            warn!("delete rejected: no id");
            return MutationOutcome::Rejected(RejectReason::MissingId);
        };
        let _loading = LoadingGuard::enter(view);

        let removed = view.remove_local(id);
        debug!(id, on_page = removed.is_some(), "optimistic delete");

        if let Err(error) = self.store.delete(id).await {
            warn!(%error, id, "delete failed; restoring current page");
            view.refetch(view.current_page()).await;
            return MutationOutcome::Failed(error);
        }

        match self.store.list_all().await {
            Ok(remaining) => {
                info!(id, "todo deleted");
                let total_pages = compute_bounds(remaining.len(), self.page_size);
                view.set_total_pages(total_pages);
                let current = view.current_page();
                let target = clamp(current, total_pages);
                if target != current {
                    view.navigate(target).await;
                }
                MutationOutcome::Applied
            }
            Err(error) => {
                warn!(%error, id, "deleted; page count refresh failed, re-reading current page");
                view.refetch(view.current_page()).await;
                MutationOutcome::Failed(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::sample;

    #[test]
    fn next_id_is_one_past_max() {
        let existing = vec![sample(3), sample(9), sample(4)];
        assert_eq!(next_todo_id(&existing, 1_700_000_000_000), Some(10));
    }

    #[test]
    fn next_id_falls_back_to_clock_when_empty() {
        assert_eq!(next_todo_id(&[], 1_700_000_000_000), Some(1_700_000_000_000));
    }

    #[test]
    fn next_id_does_not_fill_gaps() {
        let existing = vec![sample(1), sample(5)];
        assert_eq!(next_todo_id(&existing, 0), Some(6));
    }

    #[test]
    fn next_id_does_not_overflow() {
        let existing = vec![sample(i64::MAX)];
        assert_eq!(next_todo_id(&existing, 0), None);
    }

    #[test]
    fn clock_is_after_2020() {
        assert!(unix_millis() > 1_577_836_800_000);
    }
}
