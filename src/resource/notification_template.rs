//! Notification templates, identified by the immutable pair
//! (`name`, `template_type`)

use super::values::{changed, FormValues};
use super::variables::{join_variables, nullable_list};
use super::{Resource, ResourceKind};
use crate::api::{notification_templates, ApiError, CmsClient};
use crate::panel::{Completion, PanelMessage};
use crate::store::{CollectionCache, ResourceStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;

/// Delivery channel of a notification template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    Email,
    Slack,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Slack => "slack",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "slack" => Ok(Self::Slack),
            other => Err(format!("Unknown template type: {}", other)),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub id: i64,
    pub name: String,
    pub template_type: TemplateType,
    pub category: String,
    #[serde(default)]
    pub subject_template: Option<String>,
    pub body_template: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, deserialize_with = "nullable_list")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNotificationTemplate {
    pub name: String,
    pub template_type: TemplateType,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_template: Option<String>,
    pub body_template: String,
    pub is_active: bool,
    pub is_default: bool,
    pub variables: Vec<String>,
}

/// Partial update payload; `name` and `template_type` are write-once and never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationTemplateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// Server-side list filter
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NotificationTemplateFilter {
    pub template_type: Option<TemplateType>,
}

fn require_subject(template_type: TemplateType, subject: Option<&str>) -> Result<(), String> {
    if template_type == TemplateType::Email && subject.map_or(true, |s| s.trim().is_empty()) {
        return Err("Subject is required for email templates".to_string());
    }
    Ok(())
}

impl Resource for NotificationTemplate {
    type Filter = NotificationTemplateFilter;
    type Create = NewNotificationTemplate;
    type Update = NotificationTemplateUpdate;

    const KIND: ResourceKind = ResourceKind::NotificationTemplates;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_key(&self) -> String {
        format!("{} ({})", self.name, self.template_type)
    }

    fn category_value(&self) -> &str {
        self.template_type.as_str()
    }

    fn form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("name", &self.name)
            .with_text("template_type", self.template_type.as_str())
            .with_text("category", &self.category)
            .with_text(
                "subject_template",
                self.subject_template.clone().unwrap_or_default(),
            )
            .with_text("body_template", &self.body_template)
            .with_text("variables", join_variables(&self.variables))
            .with_flag("is_active", self.is_active)
            .with_flag("is_default", self.is_default)
    }

    fn create_payload(values: &FormValues) -> Result<NewNotificationTemplate, String> {
        let template_type: TemplateType = values.line("template_type").parse()?;
        let subject_template = values.optional_line("subject_template");
        require_subject(template_type, subject_template.as_deref())?;

        Ok(NewNotificationTemplate {
            name: values.line("name"),
            template_type,
            category: values.line("category"),
            subject_template,
            body_template: values.text("body_template").to_string(),
            is_active: values.flag("is_active"),
            is_default: values.flag("is_default"),
            variables: values.variables("variables"),
        })
    }

    fn update_payload(&self, values: &FormValues) -> Result<NotificationTemplateUpdate, String> {
        let subject = values.line("subject_template");
        require_subject(self.template_type, Some(&subject))?;

        let current_subject = self.subject_template.clone().unwrap_or_default();
        Ok(NotificationTemplateUpdate {
            category: changed(&self.category, values.line("category")),
            subject_template: changed(&current_subject, subject),
            body_template: changed(&self.body_template, values.text("body_template").to_string()),
            variables: changed(&self.variables, values.variables("variables")),
            is_active: changed(&self.is_active, values.flag("is_active")),
            is_default: changed(&self.is_default, values.flag("is_default")),
        })
    }

    fn scope(
        _filter: &NotificationTemplateFilter,
        category: Option<&str>,
        _search: Option<&str>,
    ) -> NotificationTemplateFilter {
        NotificationTemplateFilter {
            template_type: category.and_then(|c| c.parse().ok()),
        }
    }

    fn list(
        client: &CmsClient,
        filter: &NotificationTemplateFilter,
    ) -> impl Future<Output = Result<Vec<Self>, ApiError>> + Send {
        notification_templates::list(client, filter.template_type)
    }

    fn create(
        client: &CmsClient,
        payload: &NewNotificationTemplate,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send {
        notification_templates::create(client, payload)
    }

    fn update(
        client: &CmsClient,
        id: i64,
        payload: &NotificationTemplateUpdate,
    ) -> impl Future<Output = Result<Self, ApiError>> + Send {
        notification_templates::update(client, id, payload)
    }

    fn delete(client: &CmsClient, id: i64) -> impl Future<Output = Result<(), ApiError>> + Send {
        notification_templates::delete(client, id)
    }

    fn import(
        client: &CmsClient,
        action: &str,
    ) -> impl Future<Output = Result<usize, ApiError>> + Send {
        async move {
            match action {
                "import-missing" => Ok(notification_templates::import_missing(client)
                    .await?
                    .count()),
                other => Err(ApiError::UnsupportedAction(other.to_string())),
            }
        }
    }

    fn cache(store: &ResourceStore) -> &CollectionCache<Self> {
        &store.notification_templates
    }

    fn cache_mut(store: &mut ResourceStore) -> &mut CollectionCache<Self> {
        &mut store.notification_templates
    }

    fn into_message(completion: Completion<Self>) -> PanelMessage {
        PanelMessage::NotificationTemplates(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slack_template() -> NotificationTemplate {
        NotificationTemplate {
            id: 4,
            name: "deploy_done".to_string(),
            template_type: TemplateType::Slack,
            category: "ops".to_string(),
            subject_template: None,
            body_template: "Deployed {{version}}".to_string(),
            is_active: true,
            is_default: false,
            variables: vec!["version".to_string()],
            created_at: None,
            updated_at: None,
        }
    }

    fn email_values() -> FormValues {
        FormValues::new()
            .with_text("name", "welcome")
            .with_text("template_type", "email")
            .with_text("category", "auth")
            .with_text("subject_template", "")
            .with_text("body_template", "Hello")
            .with_text("variables", "")
            .with_flag("is_active", true)
            .with_flag("is_default", false)
    }

    #[test]
    fn test_email_requires_subject() {
        let err = NotificationTemplate::create_payload(&email_values()).unwrap_err();
        assert!(err.contains("Subject"));

        let values = email_values().with_text("subject_template", "Welcome!");
        let payload = NotificationTemplate::create_payload(&values).unwrap();
        assert_eq!(payload.subject_template.as_deref(), Some("Welcome!"));
    }

    #[test]
    fn test_slack_without_subject_is_valid() {
        let values = email_values().with_text("template_type", "slack");
        let payload = NotificationTemplate::create_payload(&values).unwrap();
        assert_eq!(payload.template_type, TemplateType::Slack);
        let body = serde_json::to_value(&payload).unwrap();
        assert!(body.get("subject_template").is_none());
    }

    #[test]
    fn test_update_never_sends_natural_key() {
        let template = slack_template();
        let values = template
            .form_values()
            .with_text("name", "other")
            .with_text("template_type", "email")
            .with_flag("is_default", true);
        let body = serde_json::to_value(template.update_payload(&values).unwrap()).unwrap();
        assert_eq!(body, json!({"is_default": true}));
    }

    #[test]
    fn test_template_type_parse_and_wire_format() {
        assert_eq!("Email".parse::<TemplateType>().unwrap(), TemplateType::Email);
        assert!("sms".parse::<TemplateType>().is_err());
        assert_eq!(serde_json::to_value(TemplateType::Slack).unwrap(), json!("slack"));
    }

    #[test]
    fn test_category_filter_uses_template_type() {
        assert_eq!(slack_template().category_value(), "slack");
        assert_eq!(slack_template().display_key(), "deploy_done (slack)");
    }

    #[test]
    fn test_scope_maps_category_to_template_type() {
        let all = NotificationTemplateFilter::default();
        let slack = NotificationTemplate::scope(&all, Some("slack"), Some("deploy"));
        assert_eq!(slack.template_type, Some(TemplateType::Slack));
        assert_eq!(NotificationTemplate::scope(&slack, None, None), all);
    }
}
