use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::CvStorage;
use crate::error::{Error, Result};
use crate::models::upload::{CvFile, UploadedFile};
use crate::utils::signing;

/// Keeps CVs on local disk. Files are only served through HMAC-signed links.
pub struct LocalCvStorage {
    root: PathBuf,
    public_base_url: String,
    secret: String,
    ttl_secs: i64,
}

impl LocalCvStorage {
    pub async fn new(root: impl AsRef<Path>, public_base_url: &str, secret: &str, ttl_secs: i64) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            secret: secret.to_string(),
            ttl_secs,
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && !key.contains('\\')
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(Error::BadRequest("Invalid file key".into()));
        }
        Ok(self.root.join(relative))
    }

    fn file_url(&self, key: &str) -> String {
        format!("{}/files/{}", self.public_base_url, key)
    }

    /// Signed link to `key` valid until `expires` (unix seconds).
    pub fn signed_link(&self, key: &str, expires: i64) -> String {
        let signature = signing::sign(&self.secret, key, expires);
        format!("{}?expires={}&signature={}", self.file_url(key), expires, signature)
    }

    /// Reads a stored file after checking its download signature.
    pub async fn read_signed(&self, key: &str, expires: i64, signature: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        let now = crate::utils::time::now().timestamp();
        if !signing::verify(&self.secret, key, expires, signature, now) {
            return Err(Error::Unauthorized);
        }
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound("File not found".into()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CvStorage for LocalCvStorage {
    async fn put(&self, key: &str, file: &CvFile) -> Result<UploadedFile> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &file.bytes).await.map_err(|e| {
            tracing::error!("Failed to write CV file: {}", e);
            Error::Storage(format!("Failed to save file: {}", e))
        })?;

        Ok(UploadedFile {
            url: self.file_url(key),
            storage_id: key.to_string(),
        })
    }

    async fn signed_url(&self, storage_id: &str) -> Result<Option<String>> {
        self.path_for(storage_id)?;
        let expires = crate::utils::time::now().timestamp() + self.ttl_secs;
        Ok(Some(self.signed_link(storage_id, expires)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    async fn storage(dir: &tempfile::TempDir) -> LocalCvStorage {
        LocalCvStorage::new(dir.path(), "http://localhost:3000/", "secret", 60)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stores_and_reads_back_through_signed_link() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        let file = CvFile {
            bytes: Bytes::from_static(b"%PDF-1.4"),
            filename: "cv.pdf".into(),
            content_type: "application/pdf".into(),
        };
        let stored = storage.put("cvs/1/123-cv.pdf", &file).await.unwrap();
        assert_eq!(stored.url, "http://localhost:3000/files/cvs/1/123-cv.pdf");
        assert_eq!(stored.storage_id, "cvs/1/123-cv.pdf");

        let expires = crate::utils::time::now().timestamp() + 60;
        let sig = signing::sign("secret", "cvs/1/123-cv.pdf", expires);
        let bytes = storage
            .read_signed("cvs/1/123-cv.pdf", expires, &sig)
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4");

        assert!(matches!(
            storage.read_signed("cvs/1/123-cv.pdf", expires, "00").await,
            Err(Error::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn refuses_keys_that_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        for key in ["../secret", "/etc/passwd", "a/../../b", "a\\b", ""] {
            assert!(matches!(
                storage.signed_url(key).await,
                Err(Error::BadRequest(_))
            ));
        }
    }
}
