//! Destinations for uploaded CV files.

mod blob;
mod drive;
mod local;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{Config, StorageBackend};
use crate::error::Result;
use crate::models::upload::{CvFile, UploadedFile};
use crate::services::google_auth::{GoogleAuth, ServiceAccountKey, DRIVE_SCOPE};

pub use blob::BlobCvStorage;
pub use drive::DriveCvStorage;
pub use local::LocalCvStorage;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CvStorage: Send + Sync {
    /// Stores `file` under `key` and returns its public URL plus storage handle.
    async fn put(&self, key: &str, file: &CvFile) -> Result<UploadedFile>;

    /// Short-lived download link for a stored file, when the backend offers one.
    async fn signed_url(&self, storage_id: &str) -> Result<Option<String>>;
}

pub struct StorageHandles {
    pub storage: Arc<dyn CvStorage>,
    /// Present only for filesystem storage, which serves its own signed downloads.
    pub local: Option<Arc<LocalCvStorage>>,
}

pub async fn build(config: &Config, client: &Client) -> Result<StorageHandles> {
    let handles = match config.storage_backend {
        StorageBackend::Local => {
            let local = Arc::new(
                LocalCvStorage::new(
                    &config.uploads_dir,
                    &config.public_base_url,
                    &config.file_signing_secret,
                    config.signed_url_ttl_secs,
                )
                .await?,
            );
            StorageHandles {
                storage: local.clone(),
                local: Some(local),
            }
        }
        StorageBackend::Blob => {
            let token = config.require(&config.blob_token, "BLOB_READ_WRITE_TOKEN")?;
            StorageHandles {
                storage: Arc::new(BlobCvStorage::new(client.clone(), &config.blob_api_url, token)),
                local: None,
            }
        }
        StorageBackend::Drive => {
            let folder = config.require(&config.drive_folder_id, "GOOGLE_DRIVE_FOLDER_ID")?;
            let creds = config.require(
                &config.google_credentials_base64,
                "GOOGLE_CLOUD_CREDENTIALS_BASE64",
            )?;
            let auth = GoogleAuth::new(
                client.clone(),
                ServiceAccountKey::from_base64(creds)?,
                &[DRIVE_SCOPE],
            );
            StorageHandles {
                storage: Arc::new(DriveCvStorage::new(client.clone(), auth, folder)),
                local: None,
            }
        }
    };
    tracing::info!(backend = ?config.storage_backend, "CV storage ready");
    Ok(handles)
}
