//! HTTP client for the backoffice admin API.

use reqwest::{header::AUTHORIZATION, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};

/// Empty query string for [`ApiClient::get`].
pub const NO_QUERY: &[(&str, &str)] = &[];

/// HTTP client for the backoffice admin API.
///
/// Requests carry `authorization: bearer <token>` when a token is set.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new client with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach an access token to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        tracing::debug!(%method, path, "API request");
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("bearer {token}")),
            None => builder,
        }
    }

    /// GET `path` with query-string parameters.
    pub async fn get<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.request(Method::GET, path).query(query).send().await?;
        self.handle_response(path, response).await
    }

    /// POST a JSON body to `path`.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        self.handle_response(path, response).await
    }

    /// PUT a JSON body to `path`.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        self.handle_response(path, response).await
    }

    /// PATCH a JSON body to `path`.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.request(Method::PATCH, path).json(body).send().await?;
        self.handle_response(path, response).await
    }

    /// DELETE `path`. Returns the confirming JSON payload, or `None` when the
    /// server answered with an empty body.
    pub async fn delete(&self, path: &str) -> Result<Option<Value>> {
        let response = self.request(Method::DELETE, path).send().await?;
        self.handle_delete_response(path, response).await
    }

    /// Handle error responses.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(ClientError::from)
        } else {
            Err(error_for_status(path, status, response).await)
        }
    }

    /// Handle delete responses (body optional).
    async fn handle_delete_response(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<Option<Value>> {
        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(path, status, response).await);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

async fn error_for_status(
    path: &str,
    status: StatusCode,
    response: reqwest::Response,
) -> ClientError {
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND => ClientError::NotFound {
            resource: path.to_string(),
        },
        _ => ClientError::ServerError {
            status: status.as_u16(),
            message,
        },
    }
}

/// Prefers a `message` or `error` field from a JSON error body (including the
/// nested `{"error": {"message": ...}}` form), then the raw body text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("message")
            .or_else(|| v.get("error"))
            .and_then(|field| field.as_str().or_else(|| field.get("message")?.as_str()))
            .map(str::to_string)
    });
    Some(from_json.unwrap_or_else(|| body.to_string()))
}
