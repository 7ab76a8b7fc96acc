//! Client-side todo collection.
//!
//! `TodoCollection` mirrors the server's todos keyed by id so callers can read
//! without a round trip each time. Reads are read-through: the first read, or
//! any read after [`TodoCollection::invalidate`] or past `stale_after`, reloads
//! the whole list from `GET /todos`.
//!
//! Writes always go to the server first. Only after the server accepts one is
//! the local map brought back in line, either by applying the returned row
//! ([`SyncStrategy::Reconcile`]) or by reloading ([`SyncStrategy::Refetch`]).
//! A rejected write leaves the map as it was, except that a 404 evicts the id.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use todo_core::{todo_key, Todo, TodoPatch};

use crate::client::{ClientError, TodoClient};

/// How the collection catches up after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStrategy {
    /// Apply the server's response to the local map.
    #[default]
    Reconcile,
    /// Drop local state and reload the list.
    Refetch,
}

enum Applied {
    Upsert(Todo),
    Remove(i64),
}

#[derive(Debug)]
pub struct TodoCollection {
    client: TodoClient,
    entries: BTreeMap<i64, Todo>,
    loaded_at: Option<Instant>,
    stale_after: Option<Duration>,
    strategy: SyncStrategy,
}

impl TodoCollection {
    pub fn new(client: TodoClient) -> Self {
        Self {
            client,
            entries: BTreeMap::new(),
            loaded_at: None,
            stale_after: None,
            strategy: SyncStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Treat a loaded collection as stale once this much time has passed.
    /// Without it, a loaded collection stays fresh until invalidated.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    pub fn is_stale(&self) -> bool {
        match (self.loaded_at, self.stale_after) {
            (None, _) => true,
            (Some(at), Some(max_age)) => at.elapsed() >= max_age,
            (Some(_), None) => false,
        }
    }

    /// Mark the collection stale; the next read reloads it.
    pub fn invalidate(&mut self) {
        self.loaded_at = None;
    }

    /// Reload from the server. On failure the previous entries are kept.
    pub async fn refetch(&mut self) -> Result<(), ClientError> {
        let todos = self.client.list().await?;
        self.entries = todos.into_iter().map(|t| (todo_key(&t), t)).collect();
        self.loaded_at = Some(Instant::now());
        tracing::debug!(count = self.entries.len(), "Todo collection refreshed");
        Ok(())
    }

    async fn ensure_fresh(&mut self) -> Result<(), ClientError> {
        if self.is_stale() {
            self.refetch().await?;
        }
        Ok(())
    }

    /// All todos, newest id first.
    pub async fn list(&mut self) -> Result<Vec<Todo>, ClientError> {
        self.ensure_fresh().await?;
        Ok(self.entries.values().rev().cloned().collect())
    }

    pub async fn get(&mut self, id: i64) -> Result<Option<Todo>, ClientError> {
        self.ensure_fresh().await?;
        Ok(self.entries.get(&id).cloned())
    }

    /// Last-known value without touching the network.
    pub fn cached(&self, id: i64) -> Option<&Todo> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn create(&mut self, title: &str, completed: bool) -> Result<Todo, ClientError> {
        let todo = self.client.create(title, completed).await?;
        self.after_write(Applied::Upsert(todo.clone())).await;
        Ok(todo)
    }

    pub async fn update(&mut self, id: i64, patch: &TodoPatch) -> Result<Todo, ClientError> {
        match self.client.update(id, patch).await {
            Ok(todo) => {
                self.after_write(Applied::Upsert(todo.clone())).await;
                Ok(todo)
            }
            Err(e) => Err(self.evict_if_missing(id, e)),
        }
    }

    pub async fn set_completed(&mut self, id: i64, completed: bool) -> Result<Todo, ClientError> {
        self.update(id, &TodoPatch::set_completed(completed)).await
    }

    pub async fn rename(&mut self, id: i64, title: &str) -> Result<Todo, ClientError> {
        self.update(id, &TodoPatch::rename(title)).await
    }

    pub async fn delete(&mut self, id: i64) -> Result<(), ClientError> {
        match self.client.delete(id).await {
            Ok(()) => {
                self.after_write(Applied::Remove(id)).await;
                Ok(())
            }
            Err(e) => Err(self.evict_if_missing(id, e)),
        }
    }

    fn evict_if_missing(&mut self, id: i64, err: ClientError) -> ClientError {
        if err.is_not_found() && self.entries.remove(&id).is_some() {
            tracing::debug!(id, "Evicted todo the server no longer has");
        }
        err
    }

    /// The write already succeeded, so a failed reload is logged rather than
    /// returned; the collection stays stale and the next read retries.
    async fn after_write(&mut self, applied: Applied) {
        match self.strategy {
            SyncStrategy::Reconcile => match applied {
                Applied::Upsert(todo) => {
                    self.entries.insert(todo_key(&todo), todo);
                }
                Applied::Remove(id) => {
                    self.entries.remove(&id);
                }
            },
            SyncStrategy::Refetch => {
                self.invalidate();
                if let Err(e) = self.refetch().await {
                    tracing::warn!(error = %e, "Refetch after write failed");
                }
            }
        }
    }
}
