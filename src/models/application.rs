use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Column order used by the export and the spreadsheet adapter.
pub const APPLICATION_COLUMNS: [&str; 13] = [
    "id",
    "created_at",
    "job_id",
    "job_title",
    "company",
    "location",
    "type",
    "tags",
    "name",
    "email",
    "phone",
    "cv_url",
    "cv_blob_id",
];

/// A stored application. The job fields are a snapshot taken at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApplicationRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub job_id: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    pub tags: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cv_url: Option<String>,
    pub cv_blob_id: Option<String>,
}

impl ApplicationRecord {
    /// Value of a canonical column; `None` renders as an empty cell.
    pub fn column(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.to_string()),
            "created_at" => Some(self.created_at.to_rfc3339()),
            "job_id" => self.job_id.clone(),
            "job_title" => self.job_title.clone(),
            "company" => self.company.clone(),
            "location" => self.location.clone(),
            "type" => self.job_type.clone(),
            "tags" => self.tags.clone(),
            "name" => self.name.clone(),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "cv_url" => self.cv_url.clone(),
            "cv_blob_id" => self.cv_blob_id.clone(),
            _ => None,
        }
    }
}

/// Fields written by every repository adapter for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub tags: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cv_url: String,
    pub cv_blob_id: String,
}

impl NewApplication {
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> ApplicationRecord {
        ApplicationRecord {
            id,
            created_at,
            job_id: Some(self.job_id),
            job_title: Some(self.job_title),
            company: Some(self.company),
            location: Some(self.location),
            job_type: Some(self.job_type),
            tags: Some(self.tags),
            name: Some(self.name),
            email: Some(self.email),
            phone: Some(self.phone),
            cv_url: Some(self.cv_url),
            cv_blob_id: Some(self.cv_blob_id),
        }
    }
}
