//! The state the presentation layer renders, and every transition on it.
//!
//! # State machine
//!
//! ```text
//! +--------+  fetch   +---------+  ok            +-------+
//! |  Idle  | -------> | Loading | -------------> | Ready |
//! +--------+          +---------+                +-------+
//!                          |  failed, nothing shown
//!                          v
//!                     +----------+
//!                     | Degraded |  placeholder todo, one page
//!                     +----------+
//! ```
//!
//! A failed read while data is on screen keeps that data and the previous
//! phase. `Loading` is reported whenever any operation is in flight.
//!
//! # Concurrency
//! Operations take `&self` and may overlap on one task (e.g. under
//! `tokio::join!`). The state lock is only held between suspension points.
//! Page reads are ticketed so a slow response cannot overwrite a newer one
//! that already landed. The count and the slice are still two separate
//! reads; a writer in between can leave `total_pages` out of step with the
//! slice, and that is tolerated.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::RemoteError;
use crate::pagination::{compute_bounds, page_offset, parse_page};
use crate::pipeline::{FetchOutcome, LoadingGuard, LocalPage, MutationOutcome, MutationPipeline};
use crate::sequence::{RequestSequencer, Target};
use crate::store::RemoteStore;
use crate::types::{NewTodo, PageWindow, Submission, Todo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing has been read yet.
    Idle,
    Loading,
    Ready,
    /// Showing the placeholder after a failed first read.
    Degraded,
}

/// Everything the presentation layer needs to render one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub todos: Vec<Todo>,
    pub loading: bool,
    pub phase: SyncPhase,
    pub window: PageWindow,
    pub editing: Option<Todo>,
}

/// User intents, dispatched in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ChangePage(u32),
    Refresh,
    Submit(Submission),
    Delete(Option<i64>),
    BeginEdit(Todo),
    CancelEdit,
}

impl Command {
    /// Page change from raw input such as a query parameter.
    pub fn change_page_from(raw: &str) -> Self {
        Command::ChangePage(parse_page(raw))
    }
}

#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Fetched(FetchOutcome),
    Mutated(MutationOutcome),
    EditChanged,
}

#[derive(Debug)]
struct SyncState {
    todos: Vec<Todo>,
    current_page: u32,
    total_pages: u32,
    editing: Option<Todo>,
    /// Last settled phase; `Loading` is derived from `in_flight`.
    settled: SyncPhase,
    in_flight: usize,
    fetches: RequestSequencer,
}

impl SyncState {
    fn new(config: &SyncConfig) -> Self {
        Self {
            todos: Vec::new(),
            current_page: 1,
            total_pages: config.initial_total_pages,
            editing: None,
            settled: SyncPhase::Idle,
            in_flight: 0,
            fetches: RequestSequencer::new(),
        }
    }

    fn phase(&self) -> SyncPhase {
        if self.in_flight > 0 {
            SyncPhase::Loading
        } else {
            self.settled
        }
    }

    fn loading(&self) -> bool {
        self.in_flight > 0 || self.settled == SyncPhase::Idle
    }
}

pub struct SyncController<S> {
    store: Arc<S>,
    pipeline: MutationPipeline<S>,
    config: SyncConfig,
    state: Mutex<SyncState>,
}

impl<S: RemoteStore> SyncController<S> {
    pub fn new(store: Arc<S>, config: SyncConfig) -> Self {
        let pipeline = MutationPipeline::new(Arc::clone(&store), config.page_size);
        Self::with_pipeline(store, pipeline, config)
    }

    /// Use a pre-built pipeline, e.g. one with a fixed clock.
    pub fn with_pipeline(store: Arc<S>, pipeline: MutationPipeline<S>, config: SyncConfig) -> Self {
        Self {
            state: Mutex::new(SyncState::new(&config)),
            store,
            pipeline,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let state = self.state.lock();
        SyncSnapshot {
            todos: state.todos.clone(),
            loading: state.loading(),
            phase: state.phase(),
            window: self.window_of(&state),
            editing: state.editing.clone(),
        }
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.state.lock().todos.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.lock().loading()
    }

    pub fn phase(&self) -> SyncPhase {
        self.state.lock().phase()
    }

    pub fn window(&self) -> PageWindow {
        self.window_of(&self.state.lock())
    }

    pub fn editing(&self) -> Option<Todo> {
        self.state.lock().editing.clone()
    }

    fn window_of(&self, state: &SyncState) -> PageWindow {
        PageWindow {
            page_size: self.config.page_size,
            current_page: state.current_page,
            total_pages: state.total_pages,
        }
    }

    /// Session start: read whatever page the controller is on.
    pub async fn start(&self) -> FetchOutcome {
        let page = self.state.lock().current_page;
        self.fetch_page(page).await
    }

    /// Single entry point for the presentation layer.
    pub async fn dispatch(&self, command: Command) -> CommandOutcome {
        debug!(?command, "dispatch");
        match command {
            Command::ChangePage(page) => CommandOutcome::Fetched(self.change_page(page).await),
            Command::Refresh => CommandOutcome::Fetched(self.start().await),
            Command::Submit(submission) => CommandOutcome::Mutated(self.submit(submission).await),
            Command::Delete(id) => CommandOutcome::Mutated(self.delete_todo(id).await),
            Command::BeginEdit(todo) => {
                self.begin_edit(todo);
                CommandOutcome::EditChanged
            }
            Command::CancelEdit => {
                self.cancel_edit();
                CommandOutcome::EditChanged
            }
        }
    }

    /// Set the current page, then read it.
    pub async fn change_page(&self, page: u32) -> FetchOutcome {
        let page = page.max(1);
        self.state.lock().current_page = page;
        self.fetch_page(page).await
    }

    /// Count the collection, read one slice, and publish both.
    ///
    /// On failure the placeholder is shown only when nothing else is; data
    /// that has loaded once is preferred even if stale.
    pub async fn fetch_page(&self, page: u32) -> FetchOutcome {
        let page = page.max(1);
        let _loading = LoadingGuard::enter(self);
        let ticket = self.state.lock().fetches.issue(Target::PageFetch);
        debug!(page, seq = ticket.seq(), "fetching page");

        let result = self.read_page(page).await;

        let mut state = self.state.lock();
        if !state.fetches.complete(ticket) {
            debug!(page, seq = ticket.seq(), "dropping superseded page response");
            return FetchOutcome::Superseded;
        }
        match result {
            Ok((todos, total_count)) => {
                state.todos = todos;
                state.total_pages = compute_bounds(total_count, self.config.page_size);
                state.settled = SyncPhase::Ready;
                FetchOutcome::Ready
            }
            Err(error) if state.todos.is_empty() => {
                warn!(%error, page, "fetch failed with nothing to show; using placeholder");
                state.todos = vec![Todo::fallback()];
                state.total_pages = 1;
                state.settled = SyncPhase::Degraded;
                FetchOutcome::Degraded
            }
            Err(error) => {
                warn!(%error, page, "fetch failed; keeping displayed todos");
                if state.settled == SyncPhase::Idle {
                    state.settled = SyncPhase::Ready;
                }
                FetchOutcome::Stale
            }
        }
    }

    /// Two independent reads: the count, then the slice.
    async fn read_page(&self, page: u32) -> Result<(Vec<Todo>, usize), RemoteError> {
        let total_count = self.store.list_all().await?.len();
        let offset = page_offset(page, self.config.page_size);
        let todos = self
            .store
            .list_page(offset, self.config.page_size as usize)
            .await?;
        Ok((todos, total_count))
    }

    pub async fn submit(&self, submission: Submission) -> MutationOutcome {
        match submission {
            Submission::Create(draft) => self.add_todo(draft).await,
            Submission::Update(todo) => self.update_todo(todo).await,
        }
    }

    pub async fn add_todo(&self, draft: NewTodo) -> MutationOutcome {
        self.pipeline.create(self, draft).await
    }

    pub async fn update_todo(&self, todo: Todo) -> MutationOutcome {
        self.pipeline.update(self, todo).await
    }

    pub async fn delete_todo(&self, id: Option<i64>) -> MutationOutcome {
        self.pipeline.delete(self, id).await
    }

    pub fn begin_edit(&self, todo: Todo) {
        self.state.lock().editing = Some(todo);
    }

    pub fn cancel_edit(&self) {
        self.state.lock().editing = None;
    }
}

#[async_trait]
impl<S: RemoteStore> LocalPage for SyncController<S> {
    fn enter_loading(&self) {
        self.state.lock().in_flight += 1;
    }

    fn exit_loading(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    fn current_page(&self) -> u32 {
        self.state.lock().current_page
    }

    fn set_total_pages(&self, total_pages: u32) {
        self.state.lock().total_pages = total_pages.max(1);
    }

    fn remove_local(&self, id: i64) -> Option<Todo> {
        let mut state = self.state.lock();
        let index = state.todos.iter().position(|t| t.id == id)?;
        Some(state.todos.remove(index))
    }

    fn replace_local(&self, todo: Todo) {
        let mut state = self.state.lock();
        if let Some(slot) = state.todos.iter_mut().find(|t| t.id == todo.id) {
            *slot = todo;
        }
    }

    fn clear_editing(&self) {
        self.cancel_edit();
    }

    async fn navigate(&self, page: u32) -> FetchOutcome {
        self.change_page(page).await
    }

    async fn refetch(&self, page: u32) -> FetchOutcome {
        self.fetch_page(page).await
    }
}
