//! Content blocks: reusable HTML snippets identified by an immutable `key`

use super::values::{changed, FormValues};
use super::variables::{join_variables, nullable_list};
use super::{Resource, ResourceKind};
use crate::api::{blocks, ApiError, CmsClient};
use crate::panel::{Completion, PanelMessage};
use crate::store::{CollectionCache, ResourceStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: i64,
    pub key: String,
    pub category: String,
    pub title: String,
    pub html_content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewContentBlock {
    pub key: String,
    pub category: String,
    pub title: String,
    pub html_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub variables: Vec<String>,
}

/// Partial update payload; `key` is write-once and never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContentBlockUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
}

/// Server-side list filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlockFilter {
    pub category: Option<String>,
}

impl Resource for ContentBlock {
    type Filter = BlockFilter;
    type Create = NewContentBlock;
    type Update = ContentBlockUpdate;

    const KIND: ResourceKind = ResourceKind::ContentBlocks;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_key(&self) -> String {
        self.key.clone()
    }

    fn category_value(&self) -> &str {
        &self.category
    }

    fn form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("key", &self.key)
            .with_text("category", &self.category)
            .with_text("title", &self.title)
            .with_text("description", self.description.clone().unwrap_or_default())
            .with_text("html_content", &self.html_content)
            .with_text("variables", join_variables(&self.variables))
    }

    fn create_payload(values: &FormValues) -> Result<NewContentBlock, String> {
        Ok(NewContentBlock {
            key: values.line("key"),
            category: values.line("category"),
            title: values.line("title"),
            html_content: values.text("html_content").to_string(),
            description: values.optional_line("description"),
            variables: values.variables("variables"),
        })
    }

    fn update_payload(&self, values: &FormValues) -> Result<ContentBlockUpdate, String> {
        let current_description = self.description.clone().unwrap_or_default();
        Ok(ContentBlockUpdate {
            category: changed(&self.category, values.line("category")),
            title: changed(&self.title, values.line("title")),
            html_content: changed(&self.html_content, values.text("html_content").to_string()),
            description: changed(&current_description, values.line("description")),
            variables: changed(&self.variables, values.variables("variables")),
        })
    }

    fn scope(_filter: &BlockFilter, category: Option<&str>, _search: Option<&str>) -> BlockFilter {
        BlockFilter {
            category: category.map(String::from),
        }
    }

    fn list(
        client: &CmsClient,
        filter: &BlockFilter,
    ) -> impl Future<Output = Result<Vec<Self>, ApiError>> + Send {
        async move { blocks::list(client, filter.category.as_deref()).await }
    }

    fn create(
        client: &CmsClient,
        payload: &NewContentBlock,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send {
        blocks::create(client, payload)
    }

    fn update(
        client: &CmsClient,
        id: i64,
        payload: &ContentBlockUpdate,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send {
        blocks::update(client, id, payload)
    }

    fn delete(client: &CmsClient, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send {
        blocks::delete(client, id)
    }

    fn import(
        client: &CmsClient,
        action: &str,
    ) -> impl Future<Output = Result<usize, ApiError>> + Send {
        async move {
            let imported = match action {
                "import-missing" => blocks::import_missing(client).await?,
                "load-terms-default" => blocks::load_terms_default(client).await?,
                other => return Err(ApiError::UnsupportedAction(other.to_string())),
            };
            Ok(imported.count())
        }
    }

    fn cache(store: &ResourceStore) -> &CollectionCache<Self> {
        &store.content_blocks
    }

    fn cache_mut(store: &mut ResourceStore) -> &mut CollectionCache<Self> {
        &mut store.content_blocks
    }

    fn into_message(completion: Completion<Self>) -> PanelMessage {
        PanelMessage::ContentBlocks(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block() -> ContentBlock {
        ContentBlock {
            id: 3,
            key: "intro".to_string(),
            category: "content".to_string(),
            title: "Welcome".to_string(),
            html_content: "<p>Hi {{user_name}}</p>".to_string(),
            description: None,
            variables: vec!["user_name".to_string()],
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_scope_sends_category_only() {
        let filter = ContentBlock::scope(&BlockFilter::default(), Some("product_tour"), Some("tour"));
        assert_eq!(filter.category.as_deref(), Some("product_tour"));
        assert_eq!(ContentBlock::scope(&filter, None, None), BlockFilter::default());
    }

    #[test]
    fn test_deserialize_null_variables() {
        let block: ContentBlock = serde_json::from_value(json!({
            "id": 1,
            "key": "intro",
            "category": "content",
            "title": "Intro",
            "html_content": "<p/>",
            "variables": null,
            "updated_at": "2024-05-01T10:00:00Z"
        }))
        .unwrap();
        assert!(block.variables.is_empty());
        assert!(block.updated_at.is_some());
    }

    #[test]
    fn test_form_round_trip_is_unchanged() {
        let block = block();
        let update = block.update_payload(&block.form_values()).unwrap();
        assert_eq!(update, ContentBlockUpdate::default());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({}));
    }

    #[test]
    fn test_update_only_sends_changed_fields() {
        let block = block();
        let values = block
            .form_values()
            .with_text("title", "Hello")
            .with_text("variables", "user_name, accept_url");
        let update = block.update_payload(&values).unwrap();

        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"title": "Hello", "variables": ["user_name", "accept_url"]})
        );
    }

    #[test]
    fn test_update_ignores_key_edits() {
        let block = block();
        let values = block.form_values().with_text("key", "renamed");
        let body = serde_json::to_value(block.update_payload(&values).unwrap()).unwrap();
        assert!(body.get("key").is_none());
    }

    #[test]
    fn test_create_payload() {
        let values = FormValues::new()
            .with_text("key", " tour_step1 ")
            .with_text("category", "product_tour")
            .with_text("title", "Step 1")
            .with_text("html_content", "<b>Go</b>\n")
            .with_text("description", "")
            .with_text("variables", "user_name,");
        let payload = ContentBlock::create_payload(&values).unwrap();
        assert_eq!(payload.key, "tour_step1");
        assert_eq!(payload.html_content, "<b>Go</b>\n");
        assert_eq!(payload.description, None);
        assert_eq!(payload.variables, vec!["user_name"]);
    }
}
