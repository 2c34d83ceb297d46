use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use crate::dto::application_dto::UploadResponse;
use crate::error::{Error, Result};
use crate::services::intake_service;
use crate::utils::{sanitize, time};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = String, content_type = "multipart/form-data", description = "`jobId` field and a `file` part"),
    responses(
        (status = 200, description = "CV stored", body = UploadResponse),
        (status = 400, description = "No file or malformed multipart body"),
        (status = 405, description = "Only POST is accepted"),
        (status = 500, description = "Storage backend rejected the file")
    )
)]
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let multipart = multipart.map_err(|e| Error::BadRequest(e.body_text()))?;
    let intake = intake_service::read_multipart(multipart).await?;

    let job_id = intake.field("jobId").unwrap_or_default().to_string();
    let Some(file) = intake.file else {
        return Err(Error::BadRequest("No file uploaded".into()));
    };

    let key = sanitize::storage_key(&state.cv_namespace, &job_id, &file.filename, time::now());
    let stored = state.storage.put(&key, &file).await.map_err(|e| {
        tracing::error!(key = %key, error = %e, "CV upload failed");
        e
    })?;

    tracing::info!(job_id = %job_id, key = %key, size = file.size(), "CV uploaded");
    Ok(Json(UploadResponse::from(stored)))
}
