use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::models::application::NewApplication;
use crate::models::upload::UploadedFile;
use crate::models::vacancy::Vacancy;

/// Body of `POST /api/apply`. Scalar values are accepted for every field and
/// stored as text; arrays of scalars are joined with commas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplyRequest {
    #[serde(deserialize_with = "scalar_text")]
    pub job_id: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub job_title: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub company: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub location: Option<String>,
    #[serde(rename = "type", deserialize_with = "scalar_text")]
    pub job_type: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub tags: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "scalar_text")]
    pub cv_url: Option<String>,
    #[serde(alias = "cvFileId", deserialize_with = "scalar_text")]
    pub cv_blob_id: Option<String>,
}

fn scalar_to_text(value: JsonValue) -> Option<std::result::Result<String, String>> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(Ok(s)),
        JsonValue::Number(n) => Some(Ok(n.to_string())),
        JsonValue::Bool(b) => Some(Ok(b.to_string())),
        JsonValue::Array(items) => {
            let parts: std::result::Result<Vec<String>, String> = items
                .into_iter()
                .filter_map(scalar_to_text)
                .collect();
            Some(parts.map(|p| p.join(",")))
        }
        JsonValue::Object(_) => Some(Err("expected text, found an object".to_string())),
    }
}

fn scalar_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    scalar_to_text(value).transpose().map_err(de::Error::custom)
}

impl ApplyRequest {
    /// Builds the denormalized payload for `vacancy` with the CV reference from the upload step.
    pub fn for_vacancy(
        vacancy: &Vacancy,
        name: &str,
        email: &str,
        phone: &str,
        cv: Option<&UploadedFile>,
    ) -> Self {
        Self {
            job_id: Some(vacancy.id.clone()),
            job_title: Some(vacancy.title.clone()),
            company: Some(vacancy.company.clone()),
            location: Some(vacancy.location.clone()),
            job_type: Some(vacancy.job_type.clone()),
            tags: Some(vacancy.tags_joined()),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            cv_url: Some(cv.map(|f| f.url.clone()).unwrap_or_default()),
            cv_blob_id: Some(cv.map(|f| f.storage_id.clone()).unwrap_or_default()),
        }
    }

    /// Names of required fields that are absent or empty, in wire spelling.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("jobId", &self.job_id),
            ("jobTitle", &self.job_title),
            ("name", &self.name),
            ("email", &self.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name.to_string())
        .collect()
    }

    pub fn into_new_application(self) -> NewApplication {
        NewApplication {
            job_id: self.job_id.unwrap_or_default(),
            job_title: self.job_title.unwrap_or_default(),
            company: self.company.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            job_type: self.job_type.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            cv_url: self.cv_url.unwrap_or_default(),
            cv_blob_id: self.cv_blob_id.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApplyResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body returned by `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_blob_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<UploadedFile> for UploadResponse {
    fn from(file: UploadedFile) -> Self {
        Self {
            ok: true,
            cv_url: Some(file.url),
            cv_blob_id: Some(file.storage_id),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedFileQuery {
    pub expires: i64,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_fields_are_stored_as_text() {
        let req: ApplyRequest = serde_json::from_value(json!({
            "jobId": 42,
            "jobTitle": "Dev",
            "tags": ["Rust", "SQL"],
            "name": "Ada",
            "email": "ada@example.com",
            "phone": null,
            "cvFileId": "file-9",
        }))
        .unwrap();
        assert_eq!(req.job_id.as_deref(), Some("42"));
        assert_eq!(req.tags.as_deref(), Some("Rust,SQL"));
        assert_eq!(req.phone, None);
        assert_eq!(req.company, None);
        assert_eq!(req.cv_blob_id.as_deref(), Some("file-9"));
        assert!(req.missing_fields().is_empty());
    }

    #[test]
    fn objects_are_rejected() {
        let err = serde_json::from_value::<ApplyRequest>(json!({"name": {"first": "Ada"}}));
        assert!(err.is_err());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let req: ApplyRequest =
            serde_json::from_value(json!({"jobId": "1", "jobTitle": "  ", "email": "a@b.co"})).unwrap();
        assert_eq!(req.missing_fields(), vec!["jobTitle", "name"]);
    }
}
