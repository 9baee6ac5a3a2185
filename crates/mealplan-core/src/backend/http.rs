//! Reqwest-backed meal plan server adapter.
//!
//! Owns transport details only: URL building, HTTP status mapping, and JSON
//! decoding. No timeout is configured; a request runs until the server
//! answers or the connection fails.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{BackendError, HealthStatus, MealPlanBackend, MealPlanHistory};
use crate::config::{ClientConfig, UserId, join_segments};

/// Meal plan server adapter speaking HTTP to one base URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Build an adapter for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL cannot carry a path or the reqwest
    /// client cannot be constructed.
    pub fn new(base_url: Url) -> Result<Self, BackendError> {
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .build()
            .map_err(|e| transport_error(&base_url, &e))?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        join_segments(&self.base_url, segments)
            .ok_or_else(|| BackendError::InvalidBaseUrl(self.base_url.to_string()))
    }
}

#[async_trait]
impl MealPlanBackend for HttpBackend {
    async fn generate(&self, user_id: &UserId) -> Result<Value, BackendError> {
        let url = self.endpoint(&["mealplan", "generate", user_id.as_str()])?;
        tracing::debug!(%url, "POST meal plan generation");
        let response = self
            .client
            .post(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;
        decode_json(&url, response).await
    }

    async fn history(&self, user_id: &UserId, limit: u32) -> Result<MealPlanHistory, BackendError> {
        let mut url = self.endpoint(&["users", user_id.as_str(), "mealplans"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        tracing::debug!(%url, "GET meal plan history");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;
        decode_json(&url, response).await
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        let url = self.endpoint(&["health"])?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(&url, &e))?;
        decode_json(&url, response).await
    }
}

async fn decode_json<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport_error(url, &e))?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    serde_json::from_slice(body.as_ref()).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Flatten a reqwest error and its sources into one line.
fn transport_error(url: &Url, error: &reqwest::Error) -> BackendError {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    BackendError::Transport {
        url: url.to_string(),
        message,
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> BackendError {
    let preview = detail_message(body).unwrap_or_else(|| body_preview(body));
    let detail = (!preview.is_empty()).then_some(preview);
    BackendError::Status {
        status: status.as_u16(),
        detail,
    }
}

/// FastAPI-style `{"detail": "..."}` error bodies.
fn detail_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value.get("detail")?.as_str().map(str::to_owned)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn endpoint_appends_segments() {
        let url = backend("http://localhost:8000")
            .endpoint(&["mealplan", "generate", "Hassan"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/mealplan/generate/Hassan");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let url = backend("http://localhost:8000/api/")
            .endpoint(&["health"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/health");
    }

    #[test]
    fn endpoint_encodes_user_id_as_one_segment() {
        let url = backend("http://localhost:8000")
            .endpoint(&["mealplan", "generate", "a b/c"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/mealplan/generate/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_base_that_cannot_carry_a_path() {
        let err = HttpBackend::new(Url::parse("mailto:chef@example.com").unwrap()).unwrap_err();
        assert!(matches!(err, BackendError::InvalidBaseUrl(_)));
    }

    #[test]
    fn status_error_prefers_fastapi_detail() {
        let err = map_status_error(StatusCode::NOT_FOUND, br#"{"detail":"User not found"}"#);
        match err {
            BackendError::Status { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail.as_deref(), Some("User not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_error_with_empty_body_has_no_detail() {
        let err = map_status_error(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert!(matches!(err, BackendError::Status { detail: None, .. }));
        assert_eq!(err.to_string(), "meal plan server returned HTTP 500");
    }

    #[test]
    fn body_preview_compacts_and_truncates() {
        let long = "word ".repeat(100);
        let preview = body_preview(long.as_bytes());
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
        assert_eq!(body_preview(b"  a\n\n b  "), "a b");
    }
}
