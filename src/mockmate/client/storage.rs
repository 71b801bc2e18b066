//! Object storage adapter. Uploads go to the bucket's media endpoint and the
//! returned download token is folded into a retrievable URL.

use crate::mockmate::{
    auth::{exchange::ObjectStorage, BinaryAsset},
    client::{build_url_with_base, handle_json_response, map_request_error, AppError},
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use tracing::{debug, instrument};

pub const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

#[derive(Clone)]
pub struct ObjectStore {
    http: Client,
    base_url: String,
    bucket: String,
}

impl ObjectStore {
    pub fn new(http: Client, base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            bucket: bucket.into(),
        }
    }

    fn objects_url(&self) -> String {
        build_url_with_base(
            &self.base_url,
            &format!("v0/b/{}/o", urlencoding::encode(&self.bucket)),
        )
    }

    /// Public URL for a stored object; several tokens may come back comma
    /// separated, the first one is used.
    #[must_use]
    pub fn download_url(&self, name: &str, download_tokens: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}?alt=media",
            self.objects_url(),
            urlencoding::encode(name)
        );
        if let Some(token) = download_tokens
            .and_then(|tokens| tokens.split(',').next())
            .filter(|token| !token.is_empty())
        {
            url.push_str("&token=");
            url.push_str(token);
        }
        url
    }
}

#[async_trait]
impl ObjectStorage for ObjectStore {
    #[instrument(skip(self, asset), fields(len = asset.bytes().len()))]
    async fn upload(&self, path: &str, asset: &BinaryAsset) -> Result<String, AppError> {
        if self.bucket.trim().is_empty() {
            return Err(AppError::Config("Storage bucket is not configured".to_string()));
        }

        let response = self
            .http
            .post(self.objects_url())
            .query(&[("name", path)])
            .header(CONTENT_TYPE, asset.declared_mime())
            .body(asset.bytes().to_vec())
            .send()
            .await
            .map_err(map_request_error)?;

        let uploaded: UploadResponse = handle_json_response(response).await?;
        debug!(name = %uploaded.name, "object stored");

        Ok(self.download_url(&uploaded.name, uploaded.download_tokens.as_deref()))
    }
}
