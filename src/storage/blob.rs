use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::CvStorage;
use crate::error::{Error, Result};
use crate::models::upload::{CvFile, UploadedFile};

const API_VERSION: &str = "7";

/// Hosted blob store addressed by pathname and authorized with a read/write token.
#[derive(Clone)]
pub struct BlobCvStorage {
    client: Client,
    api_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutBlobResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobMetadata {
    download_url: Option<String>,
}

impl BlobCvStorage {
    pub fn new(client: Client, api_url: &str, token: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl CvStorage for BlobCvStorage {
    async fn put(&self, key: &str, file: &CvFile) -> Result<UploadedFile> {
        let resp = self
            .client
            .put(format!("{}/{}", self.api_url, key))
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
            .header("x-content-type", &file.content_type)
            .header("x-add-random-suffix", "0")
            .body(file.bytes.clone())
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Upload failed").await;
            tracing::error!(error = %message, key, "Blob store rejected upload");
            return Err(Error::Storage(message));
        }

        let blob = resp.json::<PutBlobResponse>().await?;
        Ok(UploadedFile {
            storage_id: blob.url.clone(),
            url: blob.url,
        })
    }

    async fn signed_url(&self, storage_id: &str) -> Result<Option<String>> {
        let resp = self
            .client
            .get(&self.api_url)
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
            .query(&[("url", storage_id)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Blob lookup failed").await;
            return Err(Error::Storage(message));
        }
        Ok(resp.json::<BlobMetadata>().await?.download_url)
    }
}
