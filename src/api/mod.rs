//! CMS API interaction module
//!
//! Typed request/response functions for every resource under the
//! `/admin/cms` namespace.
//!
//! # Module Structure
//!
//! - [`client`] - Main client (base URL + namespace + HTTP layer)
//! - [`http`] - HTTP utilities, response checking and decoding
//! - [`error`] - The single error type every call returns
//! - [`blocks`] - Content block endpoints
//! - [`email_templates`] - Email template endpoints
//! - [`notification_templates`] - Notification template endpoints
//!
//! # Example
//!
//! ```ignore
//! use tcms::api::{blocks, CmsClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = CmsClient::new("http://localhost:8000/api", None)?;
//!     let intro_blocks = blocks::list(&client, Some("content")).await?;
//!     Ok(())
//! }
//! ```

pub mod blocks;
pub mod client;
pub mod email_templates;
pub mod error;
pub mod http;
pub mod notification_templates;

pub use client::{CmsClient, VariableHints};
pub use error::ApiError;

use serde::Deserialize;
use serde_json::Value;

/// Body of an import call: the server answers with either the entity it
/// created, the list of entities it created, or a summary object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Imported<T> {
    Many(Vec<T>),
    One(T),
    Summary(Value),
}

impl<T> Imported<T> {
    /// Number of entities the server reported
    pub fn count(&self) -> usize {
        match self {
            Imported::Many(items) => items.len(),
            Imported::One(_) => 1,
            Imported::Summary(value) => summary_count(value),
        }
    }
}

/// Count from summaries like `{"imported": 3}` or `{"created": [...]}`
fn summary_count(value: &Value) -> usize {
    ["imported", "created", "count"]
        .iter()
        .find_map(|key| match value.get(key)? {
            Value::Number(n) => n.as_u64().map(|n| n as usize),
            Value::Array(items) => Some(items.len()),
            _ => None,
        })
        .unwrap_or(0)
}
