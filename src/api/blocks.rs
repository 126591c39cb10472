//! Content block endpoints

use super::client::CmsClient;
use super::error::ApiError;
use super::Imported;
use crate::resource::{ContentBlock, ContentBlockUpdate, NewContentBlock};
use serde::Serialize;

const PATH: &str = "blocks";

#[derive(Serialize)]
struct ListQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

pub async fn list(client: &CmsClient, category: Option<&str>) -> Result<Vec<ContentBlock>, ApiError> {
    client.get(PATH, &ListQuery { category }).await
}

pub async fn create(client: &CmsClient, block: &NewContentBlock) -> Result<ContentBlock, ApiError> {
    client.post(PATH, Some(block)).await
}

pub async fn update(
    client: &CmsClient,
    id: i64,
    changes: &ContentBlockUpdate,
) -> Result<ContentBlock, ApiError> {
    client.put(&format!("{}/{}", PATH, id), changes).await
}

pub async fn delete(client: &CmsClient, id: i64) -> Result<(), ApiError> {
    client.delete(&format!("{}/{}", PATH, id)).await
}

/// Create every built-in block that does not exist yet
pub async fn import_missing(client: &CmsClient) -> Result<Imported<ContentBlock>, ApiError> {
    client
        .post::<_, Imported<ContentBlock>>(&format!("{}/import-missing", PATH), None::<&()>)
        .await
}

/// Create the built-in terms-of-service block if it does not exist yet
pub async fn load_terms_default(client: &CmsClient) -> Result<Imported<ContentBlock>, ApiError> {
    client
        .post::<_, Imported<ContentBlock>>(&format!("{}/load-terms-default", PATH), None::<&()>)
        .await
}
