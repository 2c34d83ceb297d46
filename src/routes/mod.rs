pub mod apply;
pub mod export;
pub mod files;
pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::Error;
use crate::AppState;

/// Any method a route does not serve gets a JSON 405 instead of an empty body.
pub async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

pub async fn not_found() -> Error {
    Error::NotFound("Not found".into())
}

pub fn router(state: AppState) -> Router {
    // Multipart framing adds a little on top of the file itself.
    let upload_limit = state.max_upload_bytes + 64 * 1024;

    let api = Router::new()
        .route(
            "/api/upload",
            post(upload::upload)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/apply", post(apply::apply).fallback(method_not_allowed))
        .route("/api/export", get(export::export).fallback(method_not_allowed))
        .route("/files/*key", get(files::download).fallback(method_not_allowed))
        .route("/health", get(health::health).fallback(method_not_allowed));

    api.fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
