//! Persistence accessor for todos.
//!
//! [`TodoStore`] is the seam between the HTTP handlers and the backing store.
//! Stores report absence as `None`/`false`; turning that into a 404 is the
//! caller's job.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::TodoResult;
use crate::models::{NewTodo, Todo, TodoPatch};

const TODO_COLUMNS: &str = "id, title, completed, created_at, updated_at, completed_at";

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// All todos, newest id first.
    async fn list(&self) -> TodoResult<Vec<Todo>>;

    async fn get(&self, id: i64) -> TodoResult<Option<Todo>>;

    async fn insert(&self, input: &NewTodo) -> TodoResult<Todo>;

    /// Writes only the fields present in `patch`, in a single statement.
    async fn update(&self, id: i64, patch: &TodoPatch) -> TodoResult<Option<Todo>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> TodoResult<bool>;

    /// Backend description for health reporting (e.g. the server version).
    async fn health(&self) -> TodoResult<String>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// PostgreSQL-backed store. Timestamps are maintained by the `todos_touch` trigger.
#[derive(Debug, Clone)]
pub struct PgTodoStore {
    pool: PgPool,
}

impl PgTodoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Assemble `UPDATE todos SET ... WHERE id = $n RETURNING ...` from the
/// fields present in `patch`.
pub fn build_update(id: i64, patch: &TodoPatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE todos SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(title) = patch.title() {
            set.push("title = ").push_bind_unseparated(title.to_string());
        }
        if let Some(completed) = patch.completed() {
            set.push("completed = ").push_bind_unseparated(completed);
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(TODO_COLUMNS);
    qb
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn list(&self) -> TodoResult<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos ORDER BY id DESC",
            TODO_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn get(&self, id: i64) -> TodoResult<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {} FROM todos WHERE id = $1",
            TODO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(todo)
    }

    async fn insert(&self, input: &NewTodo) -> TodoResult<Todo> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (title, completed) VALUES ($1, $2) RETURNING {}",
            TODO_COLUMNS
        ))
        .bind(&input.title)
        .bind(input.completed)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = todo.id, "Inserted todo");
        Ok(todo)
    }

    async fn update(&self, id: i64, patch: &TodoPatch) -> TodoResult<Option<Todo>> {
        let todo = build_update(id, patch)
            .build_query_as::<Todo>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(todo)
    }

    async fn delete(&self, id: i64) -> TodoResult<bool> {
        let row: Option<(i64,)> = sqlx::query_as("DELETE FROM todos WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn health(&self) -> TodoResult<String> {
        crate::db::health_check(&self.pool).await
    }

    fn name(&self) -> &str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(title: Option<&str>, completed: Option<bool>) -> String {
        let patch = TodoPatch::new(title.map(String::from), completed).unwrap();
        build_update(9, &patch).sql().to_string()
    }

    #[test]
    fn test_update_title_only() {
        assert_eq!(
            sql_for(Some("a"), None),
            format!("UPDATE todos SET title = $1 WHERE id = $2 RETURNING {}", TODO_COLUMNS)
        );
    }

    #[test]
    fn test_update_completed_only() {
        assert_eq!(
            sql_for(None, Some(true)),
            format!("UPDATE todos SET completed = $1 WHERE id = $2 RETURNING {}", TODO_COLUMNS)
        );
    }

    #[test]
    fn test_update_both_fields() {
        assert_eq!(
            sql_for(Some("a"), Some(false)),
            format!(
                "UPDATE todos SET title = $1, completed = $2 WHERE id = $3 RETURNING {}",
                TODO_COLUMNS
            )
        );
    }

    #[test]
    fn test_update_never_interpolates_values() {
        let sql = sql_for(Some("'; DROP TABLE todos; --"), Some(true));
        assert!(!sql.contains("DROP"));
    }
}
