//! Email template endpoints

use super::client::CmsClient;
use super::error::ApiError;
use super::Imported;
use crate::resource::{EmailTemplate, EmailTemplateUpdate, NewEmailTemplate};
use serde::Serialize;

const PATH: &str = "email-templates";

#[derive(Serialize)]
struct ListQuery<'a> {
    skip: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

/// One page of templates, optionally narrowed server-side by `search`
pub async fn list(
    client: &CmsClient,
    skip: u32,
    limit: u32,
    search: Option<&str>,
) -> Result<Vec<EmailTemplate>, ApiError> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    client.get(PATH, &ListQuery { skip, limit, search }).await
}

pub async fn create(
    client: &CmsClient,
    template: &NewEmailTemplate,
) -> Result<EmailTemplate, ApiError> {
    client.post(PATH, Some(template)).await
}

pub async fn update(
    client: &CmsClient,
    id: i64,
    changes: &EmailTemplateUpdate,
) -> Result<EmailTemplate, ApiError> {
    client.put(&format!("{}/{}", PATH, id), changes).await
}

pub async fn delete(client: &CmsClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("{}/{}", PATH, id)).await
}

/// Load the built-in invitation template if it does not exist yet
pub async fn load_defaults(client: &CmsClient) -> Result<Imported<EmailTemplate>, ApiError> {
    client
        .post::<_, Imported<EmailTemplate>>(&format!("{}/load-defaults", PATH), None::<&()>)
        .await
}

/// Create every built-in email template that does not exist yet
pub async fn import_missing(client: &CmsClient) -> Result<Imported<EmailTemplate>, ApiError> {
    client
        .post::<_, Imported<EmailTemplate>>(&format!("{}/import-missing", PATH), None::<&()>)
        .await
}
