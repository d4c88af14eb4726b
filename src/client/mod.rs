//! HTTP client for the notebox API.
//!
//! Used by the CLI commands and by [`poller::NotePoller`]. The base URL
//! includes the `/api/v1` prefix, e.g. `http://127.0.0.1:3000/api/v1`.

pub mod poller;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::api::ErrorBody;
use crate::config::ClientConfig;
use crate::models::*;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct NotesClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl NotesClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        // Prefer the server's message field; fall back to the raw body.
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(message)),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            _ => Err(ClientError::Server(format!("{}: {}", status, message))),
        }
    }

    // ============================================================
    // Notes
    // ============================================================

    pub async fn list_notes(&self) -> Result<Vec<Note>, ClientError> {
        let response = self.request(Method::GET, "/notes").send().await?;
        Self::handle_response(response).await
    }

    pub async fn get_note(&self, id: Uuid) -> Result<Note, ClientError> {
        let response = self
            .request(Method::GET, &format!("/notes/{}", id))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn create_note(&self, input: &NoteInput) -> Result<Note, ClientError> {
        let response = self
            .request(Method::POST, "/notes")
            .json(input)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn update_note(&self, id: Uuid, input: &NoteInput) -> Result<Note, ClientError> {
        let response = self
            .request(Method::PUT, &format!("/notes/{}", id))
            .json(input)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete_note(&self, id: Uuid) -> Result<DeleteConfirmation, ClientError> {
        let response = self
            .request(Method::DELETE, &format!("/notes/{}", id))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    // ============================================================
    // Health
    // ============================================================

    /// Fetch `/health`. A 503 still carries a status body, so it is returned
    /// as `Ok` with `status == "unavailable"`.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.request(Method::GET, "/health").send().await?;
        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(response.json().await?);
        }
        Self::handle_response(response).await
    }
}
