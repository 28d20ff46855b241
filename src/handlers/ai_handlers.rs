use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::sync::Arc;
use tracing::info;

use super::require_text;
use crate::ai::{ChatRequest, Dispatcher};
use crate::db::DbPool;
use crate::dto::AnalyzeImageDto;
use crate::errors::ApiError;
use crate::models::ImageAnalysis;
use crate::repo;
use crate::session::CurrentUser;

/// Handler for asking the tutor about an image
///
/// This function handles POST requests to `/ai/analyze-image`. The image is
/// forwarded as a data URL and the answer is kept in the caller's history.
///
/// ### Errors
///
/// - 400 for a blank prompt, a non-image MIME type or invalid base64
/// - 502/503 when no model answers
pub async fn analyze_image_handler(
    State(pool): State<Arc<DbPool>>,
    State(dispatcher): State<Arc<Dispatcher>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AnalyzeImageDto>,
) -> Result<(StatusCode, Json<ImageAnalysis>), ApiError> {
    require_text("prompt", &payload.prompt)?;
    if !payload.mime_type.starts_with("image/") {
        return Err(ApiError::Validation("mime_type must be an image type".to_string()));
    }
    if !is_image_data(&payload.image_base64) {
        return Err(ApiError::Validation("image_base64 is not valid base64".to_string()));
    }

    let prompt = payload.prompt.trim();
    let request = ChatRequest::image_analysis(prompt, &payload.mime_type, &payload.image_base64);
    let answer = dispatcher.complete_text(&request).await?;

    let analysis = ImageAnalysis::new(user.user_id(), prompt.to_string(), answer);
    repo::save_image_analysis(&pool, &analysis)?;

    info!("Stored image analysis {}", analysis.id);
    Ok((StatusCode::CREATED, Json(analysis)))
}

/// Handler for GET `/ai/image-analyses`
pub async fn list_image_analyses_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ImageAnalysis>>, ApiError> {
    Ok(Json(repo::list_image_analyses(&pool, &user.user_id())?))
}

/// True when `data` is non-empty, padded standard base64
fn is_image_data(data: &str) -> bool {
    STANDARD.decode(data).is_ok_and(|bytes| !bytes.is_empty())
}
