//! Serves uploaded files, falling back to a placeholder image for missing
//! paths so storefront pages never render broken images.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use tracing::debug;

use crate::AppState;

fn content_type_for(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

async fn serve_file(path: PathBuf) -> Option<Response> {
    let bytes = tokio::fs::read(&path).await.ok()?;
    Some(
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type_for(&path)),
                (header::CACHE_CONTROL, "public, max-age=86400"),
            ],
            bytes,
        )
            .into_response(),
    )
}

/// Serves a file from the uploads directory. Path traversal is rejected and
/// missing files resolve to the configured placeholder.
async fn serve_upload(
    State(state): State<AppState>,
    Path(rest): Path<String>,
) -> Response {
    // The wildcard can capture absolute paths (`/uploads//etc/passwd`), and
    // joining an absolute path discards the uploads root. Only plain relative
    // segments are allowed.
    let rel = std::path::Path::new(&rest);
    if rel
        .components()
        .any(|c| !matches!(c, std::path::Component::Normal(_)))
    {
        return StatusCode::NOT_FOUND.into_response();
    }

    let requested = std::path::Path::new(&state.config.uploads_dir).join(rel);
    if let Some(response) = serve_file(requested).await {
        return response;
    }

    debug!(path = %rest, "upload missing, serving placeholder");
    let placeholder = PathBuf::from(&state.config.placeholder_image);
    match serve_file(placeholder).await {
        Some(response) => response,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/uploads/*path", get(serve_upload))
}
