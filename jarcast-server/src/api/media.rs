use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::path::{Component, PathBuf};

use crate::state::AppState;

/// `GET /media/{*path}`: A file from the media directory.
///
/// Only plain relative paths are served; `..`, absolute paths and other
/// escapes are refused.
pub(super) async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Response {
    let Some(relative) = sanitize(&path) else {
        tracing::warn!(%path, "Refused media path");
        return StatusCode::NOT_FOUND.into_response();
    };

    let full_path = state.media_root.join(&relative);
    match tokio::fs::read(&full_path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&relative))], bytes).into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            tracing::error!(path = %full_path.display(), error = %e, "Failed to read media file");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Reduce a request path to a relative path below the media root.
fn sanitize(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in std::path::Path::new(path).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

fn content_type(path: &std::path::Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("gif") => "image/gif",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}
