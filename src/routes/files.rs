use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::dto::application_dto::SignedFileQuery;
use crate::error::{Error, Result};
use crate::utils::validation;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/files/{key}",
    params(
        ("key" = String, Path, description = "Storage key of the CV"),
        ("expires" = i64, Query, description = "Link expiry, unix seconds"),
        ("signature" = String, Query, description = "HMAC signature of key and expiry")
    ),
    responses(
        (status = 200, description = "File contents"),
        (status = 400, description = "Invalid key"),
        (status = 401, description = "Missing, invalid or expired signature"),
        (status = 404, description = "No such file")
    )
)]
#[axum::debug_handler]
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    query: Option<Query<SignedFileQuery>>,
) -> Result<impl IntoResponse> {
    let Some(local) = state.local_files.as_ref() else {
        return Err(Error::NotFound("File not found".into()));
    };
    let Some(Query(query)) = query else {
        return Err(Error::Unauthorized);
    };

    let bytes = local.read_signed(&key, query.expires, &query.signature).await?;
    let filename = key.rsplit('/').next().unwrap_or("cv");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, validation::cv_type_for_filename(filename).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}
