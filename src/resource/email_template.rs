//! Email templates, identified by an immutable `name`

use super::values::{changed, FormValues};
use super::variables::{join_variables, nullable_list};
use super::{Resource, ResourceKind};
use crate::api::{email_templates, ApiError, CmsClient};
use crate::panel::{Completion, PanelMessage};
use crate::store::{CollectionCache, ResourceStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Page size used when listing email templates
pub const EMAIL_PAGE_SIZE: u32 = 100;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub subject_template: String,
    pub body_html: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "nullable_list")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEmailTemplate {
    pub name: String,
    pub category: String,
    pub subject_template: String,
    pub body_html: String,
    pub is_active: bool,
    pub variables: Vec<String>,
}

/// Partial update payload; `name` is write-once and never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailTemplateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Server-side list filter: one offset/limit page plus optional search
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailTemplateFilter {
    pub skip: u32,
    pub limit: u32,
    pub search: Option<String>,
}

impl Default for EmailTemplateFilter {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: EMAIL_PAGE_SIZE,
            search: None,
        }
    }
}

impl Resource for EmailTemplate {
    type Filter = EmailTemplateFilter;
    type Create = NewEmailTemplate;
    type Update = EmailTemplateUpdate;

    const KIND: ResourceKind = ResourceKind::EmailTemplates;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_key(&self) -> String {
        self.name.clone()
    }

    fn category_value(&self) -> &str {
        &self.category
    }

    fn form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("name", &self.name)
            .with_text("category", &self.category)
            .with_text("subject_template", &self.subject_template)
            .with_text("body_html", &self.body_html)
            .with_text("variables", join_variables(&self.variables))
            .with_flag("is_active", self.is_active)
    }

    fn create_payload(values: &FormValues) -> Result<NewEmailTemplate, String> {
        Ok(NewEmailTemplate {
            name: values.line("name"),
            category: values.line("category"),
            subject_template: values.line("subject_template"),
            body_html: values.text("body_html").to_string(),
            is_active: values.flag("is_active"),
            variables: values.variables("variables"),
        })
    }

    fn update_payload(&self, values: &FormValues) -> Result<EmailTemplateUpdate, String> {
        Ok(EmailTemplateUpdate {
            category: changed(&self.category, values.line("category")),
            subject_template: changed(&self.subject_template, values.line("subject_template")),
            body_html: changed(&self.body_html, values.text("body_html").to_string()),
            variables: changed(&self.variables, values.variables("variables")),
            is_active: changed(&self.is_active, values.flag("is_active")),
        })
    }

    fn page(
        filter: &EmailTemplateFilter,
        forward: bool,
        loaded: usize,
    ) -> Option<EmailTemplateFilter> {
        let skip = if forward {
            if loaded < filter.limit as usize {
                return None;
            }
            filter.skip.checked_add(filter.limit)?
        } else if filter.skip == 0 {
            return None;
        } else {
            filter.skip.saturating_sub(filter.limit)
        };

        Some(EmailTemplateFilter {
            skip,
            ..filter.clone()
        })
    }

    fn scope(
        filter: &EmailTemplateFilter,
        _category: Option<&str>,
        search: Option<&str>,
    ) -> EmailTemplateFilter {
        let search = search.map(String::from);
        if search == filter.search {
            return filter.clone();
        }
        EmailTemplateFilter {
            skip: 0,
            limit: filter.limit,
            search,
        }
    }

    fn page_number(filter: &EmailTemplateFilter) -> Option<usize> {
        Some((filter.skip / filter.limit.max(1)) as usize + 1)
    }

    fn list(
        client: &CmsClient,
        filter: &EmailTemplateFilter,
    ) -> impl Future<Output = Result<Vec<Self>, ApiError>> + Send {
        async move {
            email_templates::list(client, filter.skip, filter.limit, filter.search.as_deref()).await
        }
    }

    fn create(
        client: &CmsClient,
        payload: &NewEmailTemplate,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send {
        email_templates::create(client, payload)
    }

    fn update(
        client: &CmsClient,
        id: i64,
        payload: &EmailTemplateUpdate,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send {
        email_templates::update(client, id, payload)
    }

    fn delete(client: &CmsClient, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send {
        email_templates::delete(client, id)
    }

    fn import(
        client: &CmsClient,
        action: &str,
    ) -> impl Future<Output = Result<usize, ApiError>> + Send {
        async move {
            let imported = match action {
                "load-defaults" => email_templates::load_defaults(client).await?,
                "import-missing" => email_templates::import_missing(client).await?,
                other => return Err(ApiError::UnsupportedAction(other.to_string())),
            };
            Ok(imported.count())
        }
    }

    fn cache(store: &ResourceStore) -> &CollectionCache<Self> {
        &store.email_templates
    }

    fn cache_mut(store: &mut ResourceStore) -> &mut CollectionCache<Self> {
        &mut store.email_templates
    }

    fn into_message(completion: Completion<Self>) -> PanelMessage {
        PanelMessage::EmailTemplates(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> EmailTemplate {
        EmailTemplate {
            id: 9,
            name: "invite".to_string(),
            category: "invites".to_string(),
            subject_template: "You're invited".to_string(),
            body_html: "<a href=\"{{accept_url}}\">Join</a>".to_string(),
            is_active: true,
            variables: vec!["user_name".to_string(), "accept_url".to_string()],
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_variables_display_round_trip() {
        let values = template().form_values();
        assert_eq!(values.text("variables"), "user_name, accept_url");
        assert_eq!(values.variables("variables"), template().variables);
    }

    #[test]
    fn test_toggle_active_only() {
        let template = template();
        let values = template.form_values().with_flag("is_active", false);
        let body = serde_json::to_value(template.update_payload(&values).unwrap()).unwrap();
        assert_eq!(body, json!({"is_active": false}));
    }

    #[test]
    fn test_paging() {
        let full = EMAIL_PAGE_SIZE as usize;
        let first = EmailTemplateFilter::default();
        assert!(EmailTemplate::page(&first, false, full).is_none());

        let second = EmailTemplate::page(&first, true, full).unwrap();
        assert_eq!(second.skip, EMAIL_PAGE_SIZE);
        assert_eq!(second.limit, EMAIL_PAGE_SIZE);

        let back = EmailTemplate::page(&second, false, 3).unwrap();
        assert_eq!(back, first);

        assert_eq!(EmailTemplate::page_number(&first), Some(1));
        assert_eq!(EmailTemplate::page_number(&second), Some(2));
    }

    #[test]
    fn test_short_page_is_the_last() {
        let first = EmailTemplateFilter::default();
        assert!(EmailTemplate::page(&first, true, 0).is_none());
        assert!(EmailTemplate::page(&first, true, EMAIL_PAGE_SIZE as usize - 1).is_none());
    }

    #[test]
    fn test_scope_sends_search_from_first_page() {
        let paged = EmailTemplateFilter {
            skip: 200,
            ..Default::default()
        };
        let searched = EmailTemplate::scope(&paged, Some("invites"), Some("invite"));
        assert_eq!(searched.skip, 0);
        assert_eq!(searched.search.as_deref(), Some("invite"));

        // Same search keeps the page
        let again = EmailTemplateFilter {
            skip: 100,
            ..searched.clone()
        };
        assert_eq!(EmailTemplate::scope(&again, None, Some("invite")), again);
        assert_eq!(EmailTemplate::scope(&again, None, None).search, None);
    }

    #[test]
    fn test_is_active_defaults_true() {
        let template: EmailTemplate = serde_json::from_value(json!({
            "id": 1,
            "name": "welcome",
            "category": "auth",
            "subject_template": "Hi",
            "body_html": "<p/>"
        }))
        .unwrap();
        assert!(template.is_active);
        assert!(template.variables.is_empty());
    }
}
