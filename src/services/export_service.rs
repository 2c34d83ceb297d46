use futures::future::join_all;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::models::application::{ApplicationRecord, APPLICATION_COLUMNS};
use crate::repository::ApplicationRepository;
use crate::storage::CvStorage;

pub const SIGNED_URL_COLUMN: &str = "cv_signed_url";

pub struct ExportService;

impl ExportService {
    pub fn key_matches(provided: Option<&str>, expected: &str) -> bool {
        let provided = provided.unwrap_or_default();
        provided.as_bytes().ct_eq(expected.as_bytes()).into()
    }

    pub fn filename(today: chrono::DateTime<chrono::Utc>) -> String {
        format!("applications-{}.csv", crate::utils::time::date_stamp(today))
    }

    /// Header row plus one line per record, each ending in `\n`. Fields are
    /// quoted only when they contain a comma, a quote or a line break.
    pub fn render_csv(rows: &[(ApplicationRecord, Option<String>)]) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let mut header: Vec<&str> = APPLICATION_COLUMNS.to_vec();
        header.push(SIGNED_URL_COLUMN);
        writer.write_record(&header)?;

        for (record, signed) in rows {
            let mut cells: Vec<String> = APPLICATION_COLUMNS
                .iter()
                .map(|col| record.column(col).unwrap_or_default())
                .collect();
            cells.push(signed.clone().unwrap_or_default());
            writer.write_record(&cells)?;
        }

        let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| Error::Internal(e.to_string()))
    }

    /// Loads every application and renders the CSV, resolving download links per record.
    pub async fn export_csv(
        repository: &dyn ApplicationRepository,
        storage: &dyn CvStorage,
    ) -> Result<String> {
        let records = repository.list_all().await?;
        let signed = join_all(records.iter().map(|r| Self::resolve_signed_url(storage, r))).await;
        let rows: Vec<(ApplicationRecord, Option<String>)> =
            records.into_iter().zip(signed).collect();
        tracing::info!(count = rows.len(), "Exporting applications");
        Self::render_csv(&rows)
    }

    async fn resolve_signed_url(storage: &dyn CvStorage, record: &ApplicationRecord) -> Option<String> {
        let storage_id = record.cv_blob_id.as_deref().filter(|id| !id.trim().is_empty())?;
        match storage.signed_url(storage_id).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(id = record.id, error = %e, "Could not sign CV link");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::NewApplication;
    use crate::repository::MockApplicationRepository;
    use crate::storage::MockCvStorage;
    use chrono::TimeZone;

    fn record(id: i64, blob: &str) -> ApplicationRecord {
        NewApplication {
            job_id: "1".into(),
            job_title: "Dev".into(),
            name: format!("Candidate {}", id),
            email: "a@b.co".into(),
            cv_blob_id: blob.into(),
            ..Default::default()
        }
        .into_record(id, chrono::Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn quotes_only_fields_that_need_it() {
        let mut tricky = record(1, "");
        tricky.company = Some("Acme, Inc.".into());
        tricky.name = Some("Ada \"the Countess\"".into());
        tricky.tags = Some("line\nbreak".into());
        tricky.phone = None;

        let csv = ExportService::render_csv(&[(tricky, None)]).unwrap();
        let (header, row) = csv.split_once('\n').unwrap();
        assert!(header.ends_with(",cv_blob_id,cv_signed_url"));
        assert!(row.contains(",\"Acme, Inc.\","), "{row}");
        assert!(row.contains(",\"line\nbreak\","), "{row}");
        assert!(row.contains(",\"Ada \"\"the Countess\"\"\",a@b.co,,"), "{row}");
        assert!(row.contains(",1,Dev,"), "{row}");
        assert!(csv.ends_with(",,\n"));
    }

    #[test]
    fn empty_export_is_just_the_header() {
        let csv = ExportService::render_csv(&[]).unwrap();
        assert_eq!(
            csv,
            "id,created_at,job_id,job_title,company,location,type,tags,name,email,phone,cv_url,cv_blob_id,cv_signed_url\n"
        );
    }

    #[test]
    fn key_comparison() {
        assert!(ExportService::key_matches(Some("ZAIN-ADMIN"), "ZAIN-ADMIN"));
        assert!(!ExportService::key_matches(Some("zain-admin"), "ZAIN-ADMIN"));
        assert!(!ExportService::key_matches(Some("ZAIN"), "ZAIN-ADMIN"));
        assert!(!ExportService::key_matches(None, "ZAIN-ADMIN"));
    }

    #[test]
    fn filename_carries_the_date() {
        let at = chrono::Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 0).unwrap();
        assert_eq!(ExportService::filename(at), "applications-2025-03-09.csv");
    }

    #[tokio::test]
    async fn signing_failures_leave_the_cell_empty() {
        let mut repo = MockApplicationRepository::new();
        repo.expect_list_all()
            .times(1)
            .returning(|| Ok(vec![record(2, "bad"), record(1, "good"), record(3, "")]));

        let mut storage = MockCvStorage::new();
        storage.expect_signed_url().returning(|id| match id {
            "good" => Ok(Some("https://files/good?sig=1".to_string())),
            _ => Err(Error::Storage("blob store offline".into())),
        });

        let csv = ExportService::export_csv(&repo, &storage).await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "id,created_at,job_id,job_title,company,location,type,tags,name,email,phone,cv_url,cv_blob_id,cv_signed_url"
        );
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("2,"));
        assert!(lines[1].ends_with(",bad,"));
        assert!(lines[2].ends_with(",good,https://files/good?sig=1"));
        assert!(lines[3].ends_with(",,"));
    }
}
