use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::Arc;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::session::CurrentUser;
use crate::stats::{self, Dashboard};

/// Handler for GET `/dashboard`
///
/// Aggregates tasks, study time and upcoming events for today.
pub async fn dashboard_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = stats::load_dashboard(pool, user.user_id(), Utc::now().date_naive()).await?;
    Ok(Json(dashboard))
}
