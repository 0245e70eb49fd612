//! In-process `RemoteStore` with failure and latency injection.
//!
//! Behaves like the json-server backend (insertion order, max+1 ids,
//! explicit ids kept) and lets tests fail individual operations, slow them
//! down, count calls, and mutate the collection between two reads the way
//! a second client would. Standing faults apply to every call of an
//! operation; scripted ones to a single upcoming call.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::RemoteError;
use crate::store::RemoteStore;
use crate::types::{CreateTodo, Todo, DEFAULT_USER_ID};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListAll,
    ListPage,
    Create,
    Update,
    Delete,
}

type Hook = Box<dyn FnOnce(&mut Vec<Todo>) + Send>;

#[derive(Debug, Clone, Copy)]
struct Scripted {
    delay: Duration,
    fail: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    todos: Mutex<Vec<Todo>>,
    failing: Mutex<HashSet<StoreOp>>,
    delays: Mutex<HashMap<StoreOp, Duration>>,
    page_delays: Mutex<HashMap<usize, Duration>>,
    scripted: Mutex<HashMap<StoreOp, VecDeque<Scripted>>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
    after_list_all: Mutex<Option<Hook>>,
}

impl MemoryStore {
    pub fn new(todos: Vec<Todo>) -> Self {
        Self {
            todos: Mutex::new(todos),
            ..Self::default()
        }
    }

    /// Todos `1..=count` titled `Todo {id}`.
    pub fn seeded(count: i64) -> Self {
        Self::new((1..=count).map(sample).collect())
    }

    pub fn snapshot(&self) -> Vec<Todo> {
        self.todos.lock().clone()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.todos.lock().iter().map(|t| t.id).collect()
    }

    /// Make every call to `op` fail until `recover` is called.
    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().insert(op);
    }

    pub fn recover(&self, op: StoreOp) {
        self.failing.lock().remove(&op);
    }

    /// Make every failing operation succeed again.
    pub fn recover_all(&self) {
        self.failing.lock().clear();
    }

    /// Delay every call to `op` by `delay`.
    pub fn delay(&self, op: StoreOp, delay: Duration) {
        self.delays.lock().insert(op, delay);
    }

    /// Delay `list_page` calls starting at `offset`.
    pub fn delay_page(&self, offset: usize, delay: Duration) {
        self.page_delays.lock().insert(offset, delay);
    }

    /// Shape one upcoming call to `op`: it waits `delay` and then fails if
    /// `fail` is set. Scripts queue up and are consumed in call order, on
    /// top of any standing delay or failure.
    pub fn script_next(&self, op: StoreOp, delay: Duration, fail: bool) {
        self.scripted
            .lock()
            .entry(op)
            .or_default()
            .push_back(Scripted { delay, fail });
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Run `hook` against the collection once, right after the next
    /// `list_all` has produced its result.
    pub fn after_next_list_all(&self, hook: impl FnOnce(&mut Vec<Todo>) + Send + 'static) {
        *self.after_list_all.lock() = Some(Box::new(hook));
    }

    /// Record the call, wait out any injected latency, then fail if asked to.
    async fn enter(&self, op: StoreOp, page_offset: Option<usize>) -> Result<(), RemoteError> {
        *self.calls.lock().entry(op).or_insert(0) += 1;

        let scripted = self.scripted.lock().get_mut(&op).and_then(VecDeque::pop_front);

        let delay = self.delays.lock().get(&op).copied();
        let page_delay = page_offset.and_then(|offset| self.page_delays.lock().get(&offset).copied());
        let delay = delay
            .into_iter()
            .chain(page_delay)
            .chain(scripted.map(|s| s.delay))
            .max();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().contains(&op) || scripted.is_some_and(|s| s.fail) {
            return Err(RemoteError::Transport(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Todo>, RemoteError> {
        self.enter(StoreOp::ListAll, None).await?;
        let mut todos = self.todos.lock();
        let all = todos.clone();
        if let Some(hook) = self.after_list_all.lock().take() {
            hook(&mut todos);
        }
        Ok(all)
    }

    async fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<Todo>, RemoteError> {
        self.enter(StoreOp::ListPage, Some(offset)).await?;
        let todos = self.todos.lock();
        Ok(todos.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn create(&self, todo: CreateTodo) -> Result<Todo, RemoteError> {
        self.enter(StoreOp::Create, None).await?;
        let mut todos = self.todos.lock();
        let id = match todo.id {
            Some(id) if todos.iter().any(|t| t.id == id) => {
                return Err(RemoteError::HttpError {
                    status: 409,
                    body: format!("duplicate id {id}"),
                })
            }
            Some(id) => id,
            None => todos
                .iter()
                .map(|t| t.id)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or_else(|| RemoteError::HttpError {
                    status: 409,
                    body: "id space exhausted".to_string(),
                })?,
        };
        let created = Todo {
            id,
            title: todo.title,
            completed: todo.completed,
            user_id: todo.user_id,
        };
        todos.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, todo: Todo) -> Result<Todo, RemoteError> {
        self.enter(StoreOp::Update, None).await?;
        let mut todos = self.todos.lock();
        let slot = todos.iter_mut().find(|t| t.id == id).ok_or(RemoteError::NotFound)?;
        *slot = Todo { id, ..todo };
        Ok(slot.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        self.enter(StoreOp::Delete, None).await?;
        let mut todos = self.todos.lock();
        let index = todos.iter().position(|t| t.id == id).ok_or(RemoteError::NotFound)?;
        todos.remove(index);
        Ok(())
    }
}

/// A plain todo with a predictable title.
pub fn sample(id: i64) -> Todo {
    Todo {
        id,
        title: format!("Todo {id}"),
        completed: false,
        user_id: DEFAULT_USER_ID,
    }
}
