//! In-process [`TodoStore`].
//!
//! Mirrors the Postgres trigger semantics: `updated_at` moves on every write,
//! `completed_at` is set when a todo becomes completed and cleared when it
//! is reopened. Useful for local runs and tests without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::TodoResult;
use crate::models::{NewTodo, Todo, TodoPatch};
use crate::store::TodoStore;

#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    rows: BTreeMap<i64, Todo>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn list(&self) -> TodoResult<Vec<Todo>> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().rev().cloned().collect())
    }

    async fn get(&self, id: i64) -> TodoResult<Option<Todo>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn insert(&self, input: &NewTodo) -> TodoResult<Todo> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let now = Utc::now();
        let todo = Todo {
            id: inner.last_id,
            title: input.title.clone(),
            completed: input.completed,
            created_at: now,
            updated_at: now,
            completed_at: input.completed.then_some(now),
        };
        inner.rows.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: i64, patch: &TodoPatch) -> TodoResult<Option<Todo>> {
        let mut inner = self.inner.write().await;
        let Some(todo) = inner.rows.get_mut(&id) else {
            return Ok(None);
        };

        let now = Utc::now();
        if let Some(title) = patch.title() {
            todo.title = title.to_string();
        }
        if let Some(completed) = patch.completed() {
            if completed && !todo.completed {
                todo.completed_at = Some(now);
            } else if !completed {
                todo.completed_at = None;
            }
            todo.completed = completed;
        }
        todo.updated_at = now;
        Ok(Some(todo.clone()))
    }

    async fn delete(&self, id: i64) -> TodoResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }

    async fn health(&self) -> TodoResult<String> {
        let count = self.inner.read().await.rows.len();
        Ok(format!("in-memory ({} todos)", count))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
