//! Todo HTTP REST API
//!
//! Axum-based HTTP server exposing the todo resource over JSON.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function returning `(StatusCode, serde_json::Value)`. The inner
//! functions take a `&dyn TodoStore` and are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET    /todos      - list todos, newest first
//! - POST   /todos      - create a todo
//! - GET    /todos/:id  - fetch one todo
//! - PATCH  /todos/:id  - partial update (title and/or completed)
//! - DELETE /todos/:id  - remove a todo
//! - GET    /health     - health check with store status
//! - GET    /version    - server version info

use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use todo_core::validate::{parse_create, parse_id, parse_patch};
use todo_core::{Todo, TodoConfig, TodoError, TodoResult, TodoStore};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn TodoStore>,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/todos", get(list_handler).post(create_handler))
        .route(
            "/todos/:id",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    store: Arc<dyn TodoStore>,
    config: TodoConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let backend = store.name().to_string();
    let state = Arc::new(HttpState { store });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(backend = %backend, "Todo HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Error / success mapping
// ============================================================================

/// Standard HTTP error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

/// Map a failure onto a status code and body. Store failures are logged and
/// reported without detail.
pub fn error_reply(err: &TodoError) -> (StatusCode, serde_json::Value) {
    if !err.is_client_error() {
        tracing::error!(error = %err, "Todo store failure");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            json_value(ErrorResponse::new("Internal server error")),
        );
    }

    let status = match err {
        TodoError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::debug!(status = status.as_u16(), error = %err, "Rejected todo request");
    (status, json_value(ErrorResponse::new(err.to_string())))
}

fn reply<T: Serialize>(
    status: StatusCode,
    result: TodoResult<T>,
) -> (StatusCode, serde_json::Value) {
    match result {
        Ok(body) => (status, json_value(body)),
        Err(e) => error_reply(&e),
    }
}

fn json_value<T: Serialize>(body: T) -> serde_json::Value {
    serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
}

/// A missing or malformed body becomes `None`; the validators reject it.
pub fn parse_body(bytes: &[u8]) -> Option<serde_json::Value> {
    serde_json::from_slice(bytes).ok()
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Inner health check - queries the store and returns (status_code, json_body).
pub async fn health_inner(store: &dyn TodoStore) -> (StatusCode, serde_json::Value) {
    match store.health().await {
        Ok(database) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "backend": store.name(),
                "database": database,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "backend": store.name(),
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version - returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api": "todos/1",
    })
}

pub async fn list_inner(store: &dyn TodoStore) -> (StatusCode, serde_json::Value) {
    reply(StatusCode::OK, store.list().await)
}

pub async fn get_inner(store: &dyn TodoStore, raw_id: &str) -> (StatusCode, serde_json::Value) {
    reply(StatusCode::OK, get_todo(store, raw_id).await)
}

pub async fn create_inner(
    store: &dyn TodoStore,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    reply(StatusCode::CREATED, create_todo(store, body).await)
}

pub async fn update_inner(
    store: &dyn TodoStore,
    raw_id: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    reply(StatusCode::OK, update_todo(store, raw_id, body).await)
}

/// Inner delete: 204 with a null body on success.
pub async fn delete_inner(store: &dyn TodoStore, raw_id: &str) -> (StatusCode, serde_json::Value) {
    match delete_todo(store, raw_id).await {
        Ok(()) => (StatusCode::NO_CONTENT, serde_json::Value::Null),
        Err(e) => error_reply(&e),
    }
}

// Validation always runs to completion before the store is touched.

async fn get_todo(store: &dyn TodoStore, raw_id: &str) -> TodoResult<Todo> {
    let id = parse_id(raw_id)?;
    store.get(id).await?.ok_or(TodoError::NotFound)
}

async fn create_todo(store: &dyn TodoStore, body: Option<serde_json::Value>) -> TodoResult<Todo> {
    let input = parse_create(body.as_ref())?;
    let todo = store.insert(&input).await?;
    tracing::info!(id = todo.id, completed = todo.completed, "Created todo");
    Ok(todo)
}

async fn update_todo(
    store: &dyn TodoStore,
    raw_id: &str,
    body: Option<serde_json::Value>,
) -> TodoResult<Todo> {
    let id = parse_id(raw_id)?;
    let patch = parse_patch(body.as_ref())?;
    let todo = store.update(id, &patch).await?.ok_or(TodoError::NotFound)?;
    tracing::info!(
        id,
        title = patch.title().is_some(),
        completed = ?patch.completed(),
        "Updated todo"
    );
    Ok(todo)
}

async fn delete_todo(store: &dyn TodoStore, raw_id: &str) -> TodoResult<()> {
    let id = parse_id(raw_id)?;
    if !store.delete(id).await? {
        return Err(TodoError::NotFound);
    }
    tracing::info!(id, "Deleted todo");
    Ok(())
}

// ============================================================================
// Axum handler wrappers (thin - delegate to inner functions)
// ============================================================================

fn into_response((status, body): (StatusCode, serde_json::Value)) -> Response {
    if status == StatusCode::NO_CONTENT {
        status.into_response()
    } else {
        (status, Json(body)).into_response()
    }
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> Response {
    into_response(health_inner(state.store.as_ref()).await)
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn list_handler(State(state): State<Arc<HttpState>>) -> Response {
    into_response(list_inner(state.store.as_ref()).await)
}

pub async fn get_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Response {
    into_response(get_inner(state.store.as_ref(), &id).await)
}

pub async fn create_handler(State(state): State<Arc<HttpState>>, body: Bytes) -> Response {
    into_response(create_inner(state.store.as_ref(), parse_body(&body)).await)
}

pub async fn update_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    into_response(update_inner(state.store.as_ref(), &id, parse_body(&body)).await)
}

pub async fn delete_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> Response {
    into_response(delete_inner(state.store.as_ref(), &id).await)
}

// ============================================================================
// Unit Tests - call inner functions directly against the in-memory store
// ============================================================================
