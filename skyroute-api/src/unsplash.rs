use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, extract::AppJson, state::AppState};

#[derive(Debug, Deserialize)]
pub struct TrackDownloadRequest {
    #[serde(default, alias = "downloadLocation")]
    pub download_location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrackDownloadResponse {
    pub success: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/track-unsplash-download", post(track_download))
}

/// POST /api/track-unsplash-download
/// Attribution ping for a photo the browser displayed.
async fn track_download(
    State(state): State<AppState>,
    AppJson(req): AppJson<TrackDownloadRequest>,
) -> Result<Json<TrackDownloadResponse>, AppError> {
    let location = req
        .download_location
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("download_location is required".to_string()))?;

    state.downloads.track_download(&location).await?;

    Ok(Json(TrackDownloadResponse { success: true }))
}
