//! CMS Client
//!
//! Main client for the CMS admin API, combining the base URL, the
//! `/admin/cms` namespace and the HTTP layer.

use super::error::ApiError;
use super::http::CmsHttpClient;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

/// Namespace every CMS endpoint lives under
pub const CMS_NAMESPACE: &str = "admin/cms";

/// Empty query string
pub const NO_QUERY: &[(&str, &str)] = &[];

/// Mapping of template category to the placeholder names it supports
pub type VariableHints = BTreeMap<String, Vec<String>>;

/// Main CMS client
#[derive(Clone)]
pub struct CmsClient {
    pub http: CmsHttpClient,
    base_url: String,
}

impl CmsClient {
    /// Create a new client for the API rooted at `base_url`
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL: {}", base_url))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Base URL must be http or https: {}", base_url);
        }

        let http = CmsHttpClient::new(token).context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL below the CMS namespace, e.g. `url("blocks/4")`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            CMS_NAMESPACE,
            path.trim_start_matches('/')
        )
    }

    pub async fn get<Q, T>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.http.get(&self.url(path), query).await
    }

    pub async fn post<B, T>(&self, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.http.post(&self.url(path), body).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.http.put(&self.url(path), body).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.http.delete(&self.url(path)).await
    }

    /// Placeholder names available per template category
    pub async fn variables(&self) -> Result<VariableHints, ApiError> {
        self.get("variables", NO_QUERY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = CmsClient::new("http://localhost:8000/api/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.url("blocks/7"),
            "http://localhost:8000/api/admin/cms/blocks/7"
        );
        assert_eq!(
            client.url("/email-templates"),
            "http://localhost:8000/api/admin/cms/email-templates"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(CmsClient::new("not a url", None).is_err());
        assert!(CmsClient::new("ftp://example.com", None).is_err());
    }
}
