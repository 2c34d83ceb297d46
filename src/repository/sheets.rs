use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::ApplicationRepository;
use crate::error::{Error, Result};
use crate::models::application::{ApplicationRecord, NewApplication};
use crate::services::google_auth::GoogleAuth;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Appends one row per application: timestamp first, then the application columns.
#[derive(Clone)]
pub struct SheetsApplicationRepository {
    client: Client,
    auth: GoogleAuth,
    sheet_id: String,
    range: String,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsApplicationRepository {
    pub fn new(client: Client, auth: GoogleAuth, sheet_id: &str, range: &str) -> Self {
        Self {
            client,
            auth,
            sheet_id: sheet_id.to_string(),
            range: range.to_string(),
            api_base: SHEETS_API.to_string(),
        }
    }

    /// Points the adapter at another Sheets-compatible endpoint.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.to_string();
        self
    }

    fn values_url(&self, suffix: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.api_base)
            .map_err(|e| Error::Config(format!("Invalid Sheets API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Sheets API URL cannot be a base".into()))?
            .pop_if_empty()
            .push(&self.sheet_id)
            .push("values")
            .push(&format!("{}{}", self.range, suffix));
        Ok(url)
    }
}

pub(crate) fn to_row(application: &NewApplication, timestamp: &str) -> Vec<String> {
    vec![
        timestamp.to_string(),
        application.job_id.clone(),
        application.job_title.clone(),
        application.company.clone(),
        application.location.clone(),
        application.job_type.clone(),
        application.tags.clone(),
        application.name.clone(),
        application.email.clone(),
        application.phone.clone(),
        application.cv_url.clone(),
        application.cv_blob_id.clone(),
    ]
}

/// Rows whose first cell is not a timestamp (e.g. a header row) are skipped.
pub(crate) fn from_rows(rows: Vec<Vec<String>>) -> Vec<ApplicationRecord> {
    let mut records: Vec<ApplicationRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let created_at = crate::utils::time::from_rfc3339(row.first()?).ok()?;
            let cell = |i: usize| Some(row.get(i).cloned().unwrap_or_default());
            Some(ApplicationRecord {
                id: idx as i64 + 1,
                created_at,
                job_id: cell(1),
                job_title: cell(2),
                company: cell(3),
                location: cell(4),
                job_type: cell(5),
                tags: cell(6),
                name: cell(7),
                email: cell(8),
                phone: cell(9),
                cv_url: cell(10),
                cv_blob_id: cell(11),
            })
        })
        .collect();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    records
}

#[async_trait]
impl ApplicationRepository for SheetsApplicationRepository {
    async fn insert(&self, application: &NewApplication) -> Result<()> {
        let token = self.auth.access_token().await?;
        let timestamp = crate::utils::time::now().to_rfc3339();
        let resp = self
            .client
            .post(self.values_url(":append")?)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [to_row(application, &timestamp)] }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Append failed").await;
            tracing::error!(error = %message, "Spreadsheet rejected application row");
            return Err(Error::Backend(message));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ApplicationRecord>> {
        let token = self.auth.access_token().await?;
        let resp = self
            .client
            .get(self.values_url("")?)
            .bearer_auth(token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let message = crate::utils::http::error_message(resp, "Export failed").await;
            return Err(Error::Backend(message));
        }
        let range = resp.json::<ValueRange>().await?;
        Ok(from_rows(range.values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_starts_with_timestamp() {
        let app = NewApplication {
            job_id: "7".into(),
            name: "Ada".into(),
            cv_blob_id: "file-1".into(),
            ..Default::default()
        };
        let row = to_row(&app, "2024-05-01T10:00:00+00:00");
        assert_eq!(row.len(), 12);
        assert_eq!(row[0], "2024-05-01T10:00:00+00:00");
        assert_eq!(row[1], "7");
        assert_eq!(row[7], "Ada");
        assert_eq!(row[11], "file-1");
    }

    #[test]
    fn rows_map_back_newest_first_and_skip_headers() {
        let rows = vec![
            vec!["timestamp".into(), "job_id".into()],
            vec!["2024-05-01T10:00:00Z".into(), "1".into(), "Dev".into()],
            vec!["2024-05-02T10:00:00Z".into(), "2".into()],
        ];
        let records = from_rows(rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].job_id.as_deref(), Some("2"));
        assert_eq!(records[0].id, 3);
        assert_eq!(records[0].job_title.as_deref(), Some(""));
        assert_eq!(records[1].job_title.as_deref(), Some("Dev"));
    }
}
