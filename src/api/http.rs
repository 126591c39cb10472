//! HTTP utilities for the CMS REST API

use super::error::ApiError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for CMS API calls
#[derive(Clone)]
pub struct CmsHttpClient {
    client: Client,
    token: Option<String>,
}

impl CmsHttpClient {
    /// Create a new HTTP client, optionally sending a bearer token
    pub fn new(token: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("tcms/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, token })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET with query parameters, decoding the JSON response
    pub async fn get<Q, T>(&self, url: &str, query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("GET {}", url);
        let request = self.authorize(self.client.get(url).query(query));
        let body = send(request).await?;
        decode(&body)
    }

    /// POST with an optional JSON body
    pub async fn post<B, T>(&self, url: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {}", url);
        let mut request = self.authorize(self.client.post(url));
        if let Some(body) = body {
            request = request.json(body);
        }
        let body = send(request).await?;
        decode(&body)
    }

    /// PUT with a JSON body
    pub async fn put<B, T>(&self, url: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("PUT {}", url);
        let request = self.authorize(self.client.put(url).json(body));
        let body = send(request).await?;
        decode(&body)
    }

    /// DELETE; any response body is ignored
    pub async fn delete(&self, url: &str) -> Result<(), ApiError> {
        tracing::debug!("DELETE {}", url);
        let request = self.authorize(self.client.delete(url));
        send(request).await?;
        Ok(())
    }
}

/// Send a request and return the body of a success response
async fn send(request: RequestBuilder) -> Result<String, ApiError> {
    let response = request.send().await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Only log sanitized/truncated error body
        tracing::warn!("API error: {} - {}", status, sanitize_for_log(&body));
        return Err(ApiError::from_response(status, &body));
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(String::new());
    }

    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    // Treat an empty body like JSON null so `()`/Option targets still decode
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("Failed to decode response: {} - {}", e, sanitize_for_log(body));
        ApiError::Decode(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated, 500 bytes total"));
        assert!(sanitized.len() < 300);
    }

    #[test]
    fn test_sanitize_strips_control_chars() {
        assert_eq!(sanitize_for_log("a\nb\tc d"), "abc d");
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        let value: Option<u32> = decode("").unwrap();
        assert!(value.is_none());
    }
}
