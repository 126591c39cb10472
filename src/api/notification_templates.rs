//! Notification template endpoints

use super::client::CmsClient;
use super::error::ApiError;
use super::Imported;
use crate::resource::{
    NewNotificationTemplate, NotificationTemplate, NotificationTemplateUpdate, TemplateType,
};
use serde::Serialize;

const PATH: &str = "notification-templates";

#[derive(Serialize)]
struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    template_type: Option<TemplateType>,
}

pub async fn list(
    client: &CmsClient,
    template_type: Option<TemplateType>,
) -> Result<Vec<NotificationTemplate>, ApiError> {
    client.get(PATH, &ListQuery { template_type }).await
}

pub async fn create(
    client: &CmsClient,
    template: &NewNotificationTemplate,
) -> Result<NotificationTemplate, ApiError> {
    client.post(PATH, Some(template)).await
}

pub async fn update(
    client: &CmsClient,
    id: i64,
    changes: &NotificationTemplateUpdate,
) -> Result<NotificationTemplate, ApiError> {
    client.put(&format!("{}/{}", PATH, id), changes).await
}

pub async fn delete(client: &CmsClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("{}/{}", PATH, id)).await
}

/// Create every built-in notification template that does not exist yet
pub async fn import_missing(
    client: &CmsClient,
) -> Result<Imported<NotificationTemplate>, ApiError> {
    client
        .post::<_, Imported<NotificationTemplate>>(
            &format!("{}/import-missing", PATH),
            None::<&()>,
        )
        .await
}
