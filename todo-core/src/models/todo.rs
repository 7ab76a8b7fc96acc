use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted todo. Timestamps are owned by the store; clients never set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Validated input for a create. `title` is already trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub completed: bool,
}

/// Validated partial update. At least one field is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoPatch {
    title: Option<String>,
    completed: Option<bool>,
}

impl TodoPatch {
    /// Returns `None` when neither field is supplied.
    pub fn new(title: Option<String>, completed: Option<bool>) -> Option<Self> {
        if title.is_none() && completed.is_none() {
            return None;
        }
        Some(Self { title, completed })
    }

    pub fn rename(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    pub fn set_completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn completed(&self) -> Option<bool> {
        self.completed
    }
}

/// Key used by client-side collections to index todos.
pub fn todo_key(todo: &Todo) -> i64 {
    todo.id
}
