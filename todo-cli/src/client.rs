//! HTTP client for the todo REST API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use todo_core::{Todo, TodoPatch};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:3000";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TodoClient {
    client: Client,
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list(&self) -> Result<Vec<Todo>, ClientError> {
        let resp = self.client.get(self.url("/todos")).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Todo, ClientError> {
        let resp = self.client.get(self.todo_url(id)).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn create(&self, title: &str, completed: bool) -> Result<Todo, ClientError> {
        let body = json!({ "title": title, "completed": completed });
        let resp = self.client.post(self.url("/todos")).json(&body).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    /// Sends only the fields present in `patch`.
    pub async fn update(&self, id: i64, patch: &TodoPatch) -> Result<Todo, ClientError> {
        let mut body = Map::new();
        if let Some(title) = patch.title() {
            body.insert("title".to_string(), Value::from(title));
        }
        if let Some(completed) = patch.completed() {
            body.insert("completed".to_string(), Value::from(completed));
        }
        let resp = self
            .client
            .patch(self.todo_url(id))
            .json(&Value::Object(body))
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let resp = self.client.delete(self.todo_url(id)).send().await?;
        check(resp).await?;
        Ok(())
    }

    /// Raw `GET /health` body.
    pub async fn health(&self) -> Result<Value, ClientError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn todo_url(&self, id: i64) -> String {
        format!("{}/todos/{}", self.base_url, id)
    }
}

/// Turn a non-2xx response into `ClientError::Api`, keeping the server's message.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or(text);

    tracing::debug!(status = status.as_u16(), message = %message, "Todo API error");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
