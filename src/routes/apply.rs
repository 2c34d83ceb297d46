use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use serde_json::Value as JsonValue;

use crate::dto::application_dto::{ApplyRequest, ApplyResponse};
use crate::error::{Error, Result};
use crate::AppState;

/// Records one application. The body is read as raw bytes so clients that send
/// JSON without a JSON content type are still accepted. A `null` body counts as
/// an empty object.
#[utoipa::path(
    post,
    path = "/api/apply",
    request_body = ApplyRequest,
    responses(
        (status = 200, description = "Application recorded", body = ApplyResponse),
        (status = 400, description = "Malformed body or missing required fields"),
        (status = 413, description = "Body over the request size limit"),
        (status = 405, description = "Only POST is accepted"),
        (status = 500, description = "Persistence backend rejected the record")
    )
)]
#[axum::debug_handler]
pub async fn apply(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<ApplyResponse>> {
    let body = body?;
    let value: JsonValue = serde_json::from_slice(&body)
        .map_err(|e| Error::BadRequest(format!("Invalid JSON body: {}", e)))?;
    let payload = if value.is_null() {
        ApplyRequest::default()
    } else {
        serde_json::from_value::<ApplyRequest>(value)
            .map_err(|e| Error::BadRequest(format!("Invalid JSON body: {}", e)))?
    };

    let missing = payload.missing_fields();
    if !missing.is_empty() {
        return Err(Error::MissingFields(missing));
    }

    let application = payload.into_new_application();
    state.repository.insert(&application).await.map_err(|e| {
        tracing::error!(job_id = %application.job_id, error = %e, "Failed to record application");
        e
    })?;

    tracing::info!(job_id = %application.job_id, "Application recorded");
    Ok(Json(ApplyResponse { ok: true, error: None }))
}
