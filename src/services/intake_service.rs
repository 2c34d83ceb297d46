use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::Result;
use crate::models::upload::CvFile;

const DEFAULT_FILENAME: &str = "cv";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Decoded multipart upload: scalar fields plus at most one file.
#[derive(Debug, Default)]
pub struct Intake {
    pub fields: HashMap<String, String>,
    pub file: Option<CvFile>,
}

impl Intake {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Reads every part of the request. Any part carrying a filename is the file;
/// if several are sent, the last complete one wins.
pub async fn read_multipart(mut multipart: Multipart) -> Result<Intake> {
    let mut intake = Intake::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        e
    })? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(filename) = field.file_name().map(str::to_string) else {
            let value = field.text().await?;
            intake.fields.insert(name, value);
            continue;
        };

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let bytes = field.bytes().await?;

        // Browsers send an empty, nameless part when no file was chosen.
        if filename.is_empty() && bytes.is_empty() {
            continue;
        }

        intake.file = Some(CvFile {
            bytes,
            filename: if filename.is_empty() {
                DEFAULT_FILENAME.to_string()
            } else {
                filename
            },
            content_type,
        });
    }

    Ok(intake)
}
