//! Production HTTP transport over reqwest.

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, StatusCode};
use tracing::warn;

use crate::models::Entity;

use super::{ApiError, ApiResponse, Transport};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// HTTP transport for the content API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new transport with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Send one request, retrying on 429 with exponential backoff.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Entity>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            let status = response.status();
            if status.as_u16() == 429 {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited.into());
                }
                warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return envelope_from_body(status, &text)
                .with_context(|| format!("Bad response from {}", url));
        }
    }
}

/// Interpret a response body as the uniform envelope.
///
/// On error statuses the backend usually still sends an `error`-bearing
/// envelope; that shape is passed through so the caller sees the domain
/// error. Anything else becomes a typed `ApiError`.
fn envelope_from_body(status: StatusCode, text: &str) -> Result<ApiResponse> {
    if status.is_success() {
        if text.trim().is_empty() {
            return Ok(ApiResponse::default());
        }
        return serde_json::from_str(text).context("Failed to parse API response body");
    }

    if let Ok(envelope) = serde_json::from_str::<ApiResponse>(text) {
        if envelope.is_err() {
            return Ok(envelope);
        }
    }
    Err(ApiError::from_status(status, text).into())
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Entity) -> Result<ApiResponse> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: &Entity) -> Result<ApiResponse> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let transport = HttpTransport::new("https://api.example.com/").unwrap();
        assert_eq!(
            transport.url("/categories?limit=10"),
            "https://api.example.com/categories?limit=10"
        );
    }

    #[test]
    fn test_success_body_parses_envelope() {
        let envelope = envelope_from_body(
            StatusCode::OK,
            r#"{"content": [{"id": "p1", "title": "Hello"}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.content.len(), 1);
    }

    #[test]
    fn test_empty_success_body_is_default_envelope() {
        let envelope = envelope_from_body(StatusCode::NO_CONTENT, "").unwrap();
        assert!(envelope.content.is_empty());
        assert!(!envelope.is_err());
    }

    #[test]
    fn test_error_status_with_envelope_passes_through() {
        let envelope =
            envelope_from_body(StatusCode::CONFLICT, r#"{"error": "duplicate title"}"#).unwrap();
        assert_eq!(envelope.error.as_deref(), Some("duplicate title"));
    }

    #[test]
    fn test_error_status_without_envelope_is_typed() {
        let result = envelope_from_body(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(result.is_err());
    }
}
