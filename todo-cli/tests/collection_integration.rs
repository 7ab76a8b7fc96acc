//! Collection cache behaviour against a mocked todo API.

use std::time::Duration;

use serde_json::{json, Value};
use todo_cli::{ClientError, SyncStrategy, TodoClient, TodoCollection};
use todo_core::TodoPatch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn todo_json(id: i64, title: &str, completed: bool) -> Value {
    let completed_at = if completed {
        json!("2026-10-16T09:30:00Z")
    } else {
        Value::Null
    };
    json!({
        "id": id,
        "title": title,
        "completed": completed,
        "createdAt": "2026-10-16T09:00:00Z",
        "updatedAt": "2026-10-16T09:30:00Z",
        "completedAt": completed_at,
    })
}

fn collection(server: &MockServer) -> TodoCollection {
    TodoCollection::new(TodoClient::new(&server.uri()).unwrap())
}

async fn mount_list(server: &MockServer, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

// ===========================================================================
// Read-through
// ===========================================================================

#[tokio::test]
async fn test_reads_are_served_from_cache_after_first_load() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([todo_json(2, "Read a book", true), todo_json(1, "Buy groceries", false)]),
        1,
    )
    .await;

    let mut todos = collection(&server);
    assert!(todos.is_stale());

    let list = todos.list().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, 2, "newest first");
    assert!(!todos.is_stale());

    let one = todos.get(1).await.unwrap().unwrap();
    assert_eq!(one.title, "Buy groceries");
    assert!(todos.get(99).await.unwrap().is_none());
    assert_eq!(todos.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalidate_forces_reload() {
    let server = MockServer::start().await;
    mount_list(&server, json!([todo_json(1, "a", false)]), 2).await;

    let mut todos = collection(&server);
    todos.list().await.unwrap();
    todos.invalidate();
    assert!(todos.is_stale());
    assert!(todos.cached(1).is_some(), "invalidate keeps last-known values");
    todos.list().await.unwrap();
}

#[tokio::test]
async fn test_stale_after_zero_reloads_every_read() {
    let server = MockServer::start().await;
    mount_list(&server, json!([]), 3).await;

    let mut todos = collection(&server).with_stale_after(Duration::ZERO);
    for _ in 0..3 {
        todos.list().await.unwrap();
    }
}

#[tokio::test]
async fn test_fetch_error_surfaces_and_keeps_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([todo_json(1, "a", false)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": "Internal server error", "status": "error"})),
        )
        .mount(&server)
        .await;

    let mut todos = collection(&server);
    todos.list().await.unwrap();
    todos.invalidate();

    let err = todos.list().await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(todos.len(), 1);
    assert!(todos.is_stale());
}

// ===========================================================================
// Writes with Reconcile
// ===========================================================================

#[tokio::test]
async fn test_create_reconciles_without_reload() {
    let server = MockServer::start().await;
    mount_list(&server, json!([todo_json(1, "old", false)]), 1).await;
    Mock::given(method("POST"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(todo_json(2, "Buy milk", false)))
        .expect(1)
        .mount(&server)
        .await;

    let mut todos = collection(&server);
    todos.list().await.unwrap();

    let created = todos.create("  Buy milk  ", false).await.unwrap();
    assert_eq!(created.title, "Buy milk");

    let list = todos.list().await.unwrap();
    let ids: Vec<i64> = list.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_update_replaces_entry_with_server_row() {
    let server = MockServer::start().await;
    mount_list(&server, json!([todo_json(1, "a", false)]), 1).await;
    Mock::given(method("PATCH"))
        .and(path("/todos/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(todo_json(1, "a", true)))
        .mount(&server)
        .await;

    let mut todos = collection(&server);
    todos.list().await.unwrap();

    todos.set_completed(1, true).await.unwrap();
    let cached = todos.cached(1).unwrap();
    assert!(cached.completed);
    assert!(cached.completed_at.is_some());
}

#[tokio::test]
async fn test_delete_removes_entry() {
    let server = MockServer::start().await;
    mount_list(&server, json!([todo_json(2, "b", false), todo_json(1, "a", false)]), 1).await;
    Mock::given(method("DELETE"))
        .and(path("/todos/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut todos = collection(&server);
    todos.list().await.unwrap();
    todos.delete(1).await.unwrap();

    assert!(todos.cached(1).is_none());
    assert_eq!(todos.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_write_leaves_cache_untouched() {
    let server = MockServer::start().await;
    mount_list(&server, json!([todo_json(1, "a", false)]), 1).await;
    Mock::given(method("POST"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "Invalid body: { title: string; completed?: boolean }",
            "status": "error",
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/todos/1"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "title must not be empty", "status": "error"})),
        )
        .mount(&server)
        .await;

    let mut todos = collection(&server);
    todos.list().await.unwrap();

    let err = todos.create("   ", false).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));

    let err = todos.rename(1, " ").await.unwrap_err();
    assert_eq!(err.status(), Some(400));

    assert_eq!(todos.len(), 1);
    assert_eq!(todos.cached(1).unwrap().title, "a");
}

#[tokio::test]
async fn test_not_found_write_evicts_entry() {
    let server = MockServer::start().await;
    mount_list(&server, json!([todo_json(2, "b", false), todo_json(1, "a", false)]), 1).await;
    Mock::given(method("PATCH"))
        .and(path("/todos/2"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": "Not found", "status": "error"})),
        )
        .mount(&server)
        .await;

    let mut todos = collection(&server);
    todos.list().await.unwrap();

    let err = todos
        .update(2, &TodoPatch::set_completed(true))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(todos.cached(2).is_none());
    assert!(todos.cached(1).is_some());
}

// ===========================================================================
// Writes with Refetch
// ===========================================================================

#[tokio::test]
async fn test_refetch_strategy_reloads_after_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([todo_json(1, "from server", false)])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(todo_json(1, "ignored", false)))
        .mount(&server)
        .await;

    let mut todos = collection(&server).with_strategy(SyncStrategy::Refetch);
    assert_eq!(todos.strategy(), SyncStrategy::Refetch);
    assert!(todos.list().await.unwrap().is_empty());

    todos.create("ignored", false).await.unwrap();

    // Served from the reload, not from the POST response.
    let list = todos.list().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "from server");
}

#[tokio::test]
async fn test_refetch_failure_after_write_leaves_collection_stale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todos"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/todos/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let mut todos = collection(&server).with_strategy(SyncStrategy::Refetch);
    todos.delete(4).await.unwrap();
    assert!(todos.is_stale());
}
