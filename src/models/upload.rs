use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Reference to a stored CV, handed from the upload step to the apply step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    /// Backend-specific handle: blob URL, drive file id or local storage key.
    pub storage_id: String,
}

/// A CV received from a candidate, before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvFile {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: String,
}

impl CvFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
