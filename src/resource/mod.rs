//! Resource abstraction layer
//!
//! Every CMS entity type that gets a panel implements [`Resource`]: how it
//! maps to and from form values, which partial payload an edit produces and
//! which client calls back it. Table columns, form fields, filter presets and
//! import actions come from the embedded JSON schema in [`registry`].
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource schemas from embedded JSON
//! - [`values`] - Form values and the diffing used by partial updates
//! - [`variables`] - Comma separated placeholder-list codec
//!
//! # Resource Definitions
//!
//! Schemas live in `src/resources/cms.json`, keyed by [`ResourceKind::key`].
//!
//! # Example
//!
//! ```ignore
//! use tcms::resource::{ContentBlock, Resource, BlockFilter};
//!
//! async fn tour_blocks(client: &tcms::api::CmsClient) -> Vec<ContentBlock> {
//!     let filter = BlockFilter { category: Some("product_tour".into()) };
//!     ContentBlock::list(client, &filter).await.unwrap_or_default()
//! }
//! ```

mod content_block;
mod email_template;
mod notification_template;
mod registry;
pub mod values;
pub mod variables;

pub use content_block::{BlockFilter, ContentBlock, ContentBlockUpdate, NewContentBlock};
pub use email_template::{
    EmailTemplate, EmailTemplateFilter, EmailTemplateUpdate, NewEmailTemplate, EMAIL_PAGE_SIZE,
};
pub use notification_template::{
    NewNotificationTemplate, NotificationTemplate, NotificationTemplateFilter,
    NotificationTemplateUpdate, TemplateType,
};
pub use registry::*;
pub use values::{changed, FieldValue, FormValues};
pub use variables::{join_variables, parse_variables};

use crate::api::{ApiError, CmsClient};
use crate::panel::{Completion, PanelMessage};
use crate::store::{CollectionCache, ResourceStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

/// The resource types that get a panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ContentBlocks,
    EmailTemplates,
    NotificationTemplates,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::ContentBlocks,
        ResourceKind::EmailTemplates,
        ResourceKind::NotificationTemplates,
    ];

    /// Registry key, also the endpoint path segment
    pub fn key(&self) -> &'static str {
        match self {
            Self::ContentBlocks => "content-blocks",
            Self::EmailTemplates => "email-templates",
            Self::NotificationTemplates => "notification-templates",
        }
    }

    pub fn display_name(&self) -> &'static str {
        &resource_def(*self).display_name
    }
}

/// A CMS entity type that can be listed, created, edited, deleted and
/// imported through a generic panel.
pub trait Resource:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Server-side list filter. Each distinct value is its own cache key.
    type Filter: Clone + Debug + Default + Eq + Hash + Send + Sync + 'static;
    /// Create payload
    type Create: Debug + Serialize + Send + Sync + 'static;
    /// Partial update payload; cannot express natural-key fields
    type Update: Debug + Serialize + Send + Sync + 'static;

    const KIND: ResourceKind;

    fn id(&self) -> i64;

    /// Human readable natural key, used in notifications and dialogs
    fn display_key(&self) -> String;

    /// Value the categorical filter matches against
    fn category_value(&self) -> &str;

    /// Pre-filled values of the edit form
    fn form_values(&self) -> FormValues;

    /// Build a create payload, or explain why the values are not acceptable
    fn create_payload(values: &FormValues) -> Result<Self::Create, String>;

    /// Build a partial update carrying only the fields that differ from `self`
    fn update_payload(&self, values: &FormValues) -> Result<Self::Update, String>;

    /// Neighbouring page of a paged filter. `loaded` is the size of the
    /// current page; a short page is the last one.
    fn page(_filter: &Self::Filter, _forward: bool, _loaded: usize) -> Option<Self::Filter> {
        None
    }

    /// Server filter narrowed to the chosen category and committed search.
    /// Resources whose list endpoint takes neither keep their filter.
    fn scope(filter: &Self::Filter, _category: Option<&str>, _search: Option<&str>) -> Self::Filter {
        filter.clone()
    }

    /// One-based page number shown in the table title, for paged filters
    fn page_number(_filter: &Self::Filter) -> Option<usize> {
        None
    }

    fn list(
        client: &CmsClient,
        filter: &Self::Filter,
    ) -> impl Future<Output = Result<Vec<Self>, ApiError>> + Send;

    fn create(
        client: &CmsClient,
        payload: &Self::Create,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send;

    fn update(
        client: &CmsClient,
        id: i64,
        payload: &Self::Update,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send;

    fn delete(client: &CmsClient, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Run one of the schema's import actions, returning how many entities
    /// the server reported
    fn import(
        client: &CmsClient,
        action: &str,
    ) -> impl Future<Output = Result<usize, ApiError>> + Send;

    fn cache(store: &ResourceStore) -> &CollectionCache<Self>;

    fn cache_mut(store: &mut ResourceStore) -> &mut CollectionCache<Self>;

    /// Wrap a completion for the shared completion channel
    fn into_message(completion: Completion<Self>) -> PanelMessage;

    fn def() -> &'static ResourceDef {
        resource_def(Self::KIND)
    }
}

/// Extract a display value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let mut current = item;

    for part in path.split('.') {
        let next = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        };
        current = match next {
            Some(v) => v,
            None => return "-".to_string(),
        };
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) if arr.iter().all(Value::is_string) => arr
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => "[object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_value() {
        let item = json!({
            "key": "intro",
            "id": 7,
            "is_active": false,
            "variables": ["user_name", "accept_url"],
            "description": null,
            "meta": {"tags": [{"name": "x"}]}
        });

        assert_eq!(extract_json_value(&item, "key"), "intro");
        assert_eq!(extract_json_value(&item, "id"), "7");
        assert_eq!(extract_json_value(&item, "is_active"), "false");
        assert_eq!(extract_json_value(&item, "variables"), "user_name, accept_url");
        assert_eq!(extract_json_value(&item, "description"), "-");
        assert_eq!(extract_json_value(&item, "missing"), "-");
        assert_eq!(extract_json_value(&item, "meta.tags.0.name"), "x");
        assert_eq!(extract_json_value(&item, "meta.tags"), "[1 items]");
    }

    #[test]
    fn test_kind_keys_are_distinct() {
        let mut keys: Vec<_> = ResourceKind::ALL.iter().map(|k| k.key()).collect();
        keys.dedup();
        assert_eq!(keys.len(), 3);
        assert_eq!(ResourceKind::EmailTemplates.display_name(), "Email Templates");
    }
}
