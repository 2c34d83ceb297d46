use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::CvStorage;
use crate::error::{Error, Result};
use crate::models::upload::{CvFile, UploadedFile};
use crate::services::google_auth::GoogleAuth;

const GOOGLE_APIS: &str = "https://www.googleapis.com";
const BOUNDARY: &str = "jobfair-cv-boundary";

/// Shared-drive folder holding one file per CV; the storage id is the drive file id.
#[derive(Clone)]
pub struct DriveCvStorage {
    client: Client,
    auth: GoogleAuth,
    folder_id: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
    web_content_link: Option<String>,
}

impl DriveCvStorage {
    pub fn new(client: Client, auth: GoogleAuth, folder_id: &str) -> Self {
        Self {
            client,
            auth,
            folder_id: folder_id.to_string(),
            api_base: GOOGLE_APIS.to_string(),
        }
    }

    /// Points the adapter at another Drive-compatible endpoint.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

/// `multipart/related` body: JSON metadata part followed by the file bytes.
fn related_body(metadata: &serde_json::Value, file: &CvFile) -> Vec<u8> {
    let mut body = Vec::with_capacity(file.bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {ct}\r\n\r\n",
            b = BOUNDARY,
            m = metadata,
            ct = file.content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

#[async_trait]
impl CvStorage for DriveCvStorage {
    async fn put(&self, key: &str, file: &CvFile) -> Result<UploadedFile> {
        let token = self.auth.access_token().await?;
        let name = key.rsplit('/').next().unwrap_or(key);
        let metadata = json!({
            "name": name,
            "description": key,
            "mimeType": file.content_type,
            "parents": [self.folder_id],
        });

        let resp = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.api_base))
            .bearer_auth(token)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id,webViewLink,webContentLink"),
            ])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .body(related_body(&metadata, file))
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Upload failed").await;
            tracing::error!(error = %message, key, "Drive rejected upload");
            return Err(Error::Storage(message));
        }

        let created = resp.json::<DriveFile>().await?;
        let url = created
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{}/view", created.id));
        Ok(UploadedFile {
            url,
            storage_id: created.id,
        })
    }

    async fn signed_url(&self, storage_id: &str) -> Result<Option<String>> {
        let token = self.auth.access_token().await?;
        let resp = self
            .client
            .get(format!("{}/drive/v3/files/{}", self.api_base, storage_id))
            .bearer_auth(token)
            .query(&[("fields", "id,webContentLink"), ("supportsAllDrives", "true")])
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Drive lookup failed").await;
            return Err(Error::Storage(message));
        }
        Ok(resp.json::<DriveFile>().await?.web_content_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn related_body_wraps_metadata_and_bytes() {
        let file = CvFile {
            bytes: Bytes::from_static(b"DATA"),
            filename: "cv.pdf".into(),
            content_type: "application/pdf".into(),
        };
        let body = String::from_utf8(related_body(&json!({"name": "cv.pdf"}), &file)).unwrap();
        assert!(body.starts_with("--jobfair-cv-boundary\r\nContent-Type: application/json"));
        assert!(body.contains("{\"name\":\"cv.pdf\"}"));
        assert!(body.contains("Content-Type: application/pdf\r\n\r\nDATA\r\n"));
        assert!(body.ends_with("--jobfair-cv-boundary--\r\n"));
    }
}
