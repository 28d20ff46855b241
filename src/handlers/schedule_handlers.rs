use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::require_text;
use crate::ai::{self, Dispatcher, ScheduleBrief};
use crate::db::DbPool;
use crate::dto::{CreateEventDto, GenerateScheduleDto, ScheduleQuery};
use crate::errors::ApiError;
use crate::models::ScheduleEvent;
use crate::repo;
use crate::session::CurrentUser;

/// Handler for listing calendar entries
///
/// This function handles GET requests to `/schedule`, optionally limited to
/// one day with `?date=YYYY-MM-DD`. Entries come back in time order.
pub async fn list_events_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Vec<ScheduleEvent>>, ApiError> {
    let events = repo::list_events(&pool, &user.user_id(), query.date)?;
    Ok(Json(events))
}

/// Handler for adding a calendar entry by hand
///
/// This function handles POST requests to `/schedule`.
pub async fn create_event_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateEventDto>,
) -> Result<(StatusCode, Json<ScheduleEvent>), ApiError> {
    require_text("title", &payload.title)?;
    if chrono::NaiveTime::parse_from_str(&payload.start_time, "%H:%M").is_err() {
        return Err(ApiError::Validation("startTime must be HH:MM".to_string()));
    }

    let event = ScheduleEvent::new(
        user.user_id(),
        payload.title.trim().to_string(),
        payload.subject,
        payload.date,
        payload.start_time,
        payload.duration_minutes,
        payload.kind,
        payload.description,
    );
    let event = repo::create_event(&pool, event)?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Handler for DELETE `/schedule/{id}`
pub async fn delete_event_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if repo::delete_event(&pool, &user.user_id(), &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Event"))
    }
}

/// Handler for generating a day's plan with the language model
///
/// This function handles POST requests to `/schedule/generate`. Either every
/// generated entry is stored or none is.
///
/// ### Errors
///
/// - 400 if no subject is given or the available hours are not positive
/// - 502/503 when the model cannot be reached or its output does not parse
pub async fn generate_schedule_handler(
    State(pool): State<Arc<DbPool>>,
    State(dispatcher): State<Arc<Dispatcher>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<GenerateScheduleDto>,
) -> Result<(StatusCode, Json<Vec<ScheduleEvent>>), ApiError> {
    if payload.subjects.iter().all(|s| s.trim().is_empty()) {
        return Err(ApiError::Validation("At least one subject is required".to_string()));
    }
    if !(payload.available_hours > 0.0 && payload.available_hours <= 24.0) {
        return Err(ApiError::Validation("availableHours must be between 0 and 24".to_string()));
    }

    let date = payload.date;
    let brief = ScheduleBrief::from(payload);
    let generated = ai::generate_schedule(&*dispatcher, &brief).await?;

    let owner_id = user.user_id();
    let events: Vec<ScheduleEvent> = generated
        .into_iter()
        .map(|item| item.into_event(&owner_id, date))
        .collect();
    repo::save_generated_events(&pool, &events)?;

    info!("Stored {} generated events for {}", events.len(), date);
    Ok((StatusCode::CREATED, Json(events)))
}
