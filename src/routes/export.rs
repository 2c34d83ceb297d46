use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::dto::application_dto::ExportQuery;
use crate::error::{Error, Result};
use crate::services::export_service::ExportService;
use crate::utils::time;
use crate::AppState;

/// Download every application as CSV, newest first.
#[utoipa::path(
    get,
    path = "/api/export",
    params(
        ("key" = String, Query, description = "Export access key")
    ),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 400, description = "Malformed query string"),
        (status = 401, description = "Missing or wrong key"),
        (status = 405, description = "Only GET is accepted")
    )
)]
#[axum::debug_handler]
pub async fn export(
    State(state): State<AppState>,
    query: std::result::Result<Query<ExportQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query.map_err(|e| Error::BadRequest(e.body_text()))?;
    if !ExportService::key_matches(query.key.as_deref(), &state.export_key) {
        tracing::warn!("Rejected export request with a bad key");
        return Err(Error::Unauthorized);
    }

    let csv = ExportService::export_csv(state.repository.as_ref(), state.storage.as_ref()).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        ExportService::filename(time::now())
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
