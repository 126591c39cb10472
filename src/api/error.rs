//! Error type for CMS API calls

use reqwest::StatusCode;
use serde_json::Value;

/// Generic message used when the server gives no usable detail
pub const GENERIC_FAILURE: &str = "Request failed. Check your network connection and try again.";

/// Every way a CMS request can fail
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, ...)
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the request (validation, duplicate key, 5xx, ...)
    #[error("request rejected ({status}): {detail}")]
    Rejected { status: StatusCode, detail: String },

    /// Update or delete of an id the server no longer knows
    #[error("not found: {detail}")]
    NotFound { detail: String },

    /// Success status but the body was not what we expected
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Import action name that the resource does not offer
    #[error("unsupported action: {0}")]
    UnsupportedAction(String),
}

impl ApiError {
    /// Build the error for a non-success response from its status and raw body
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| generic_message(status));

        if status == StatusCode::NOT_FOUND {
            ApiError::NotFound { detail }
        } else {
            ApiError::Rejected { status, detail }
        }
    }

    /// Text to show to the user in a toast or form
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(e) if e.is_timeout() => {
                "The server took too long to answer. Please try again.".to_string()
            },
            ApiError::Transport(_) => GENERIC_FAILURE.to_string(),
            ApiError::Rejected { detail, .. } | ApiError::NotFound { detail } => detail.clone(),
            ApiError::Decode(_) => "The server sent a response tcms could not read.".to_string(),
            ApiError::UnsupportedAction(action) => format!("Unsupported action: {}", action),
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"detail": "..."}` as well as validation error lists of the form
/// `{"detail": [{"msg": "...", "loc": [...]}, ...]}`.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    match value.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(entries) => {
            let messages: Vec<String> = entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(|m| m.as_str()).map(String::from),
                })
                .filter(|m| !m.is_empty())
                .collect();

            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        },
        Value::Object(obj) => obj.get("msg").and_then(|m| m.as_str()).map(String::from),
        _ => None,
    }
}

/// Fallback message per status class, when the body carries no detail
fn generic_message(status: StatusCode) -> String {
    match status.as_u16() {
        400 | 422 => "Invalid request. Check the entered values.".to_string(),
        401 => "Authentication failed. Check your API token.".to_string(),
        403 => "Permission denied.".to_string(),
        404 => "Resource not found. It may have been deleted.".to_string(),
        409 => "Conflict. The resource may already exist.".to_string(),
        429 => "Rate limit exceeded. Please try again later.".to_string(),
        500..=599 => "CMS service temporarily unavailable. Please try again.".to_string(),
        _ => GENERIC_FAILURE.to_string(),
    }
}
