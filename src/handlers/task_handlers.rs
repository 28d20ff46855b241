use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;

use super::require_text;
use crate::db::DbPool;
use crate::dto::{CreateTaskDto, ReminderDto, TaskQuery};
use crate::errors::ApiError;
use crate::models::Task;
use crate::repo;
use crate::session::CurrentUser;

/// Handler for creating a new task
///
/// This function handles POST requests to `/tasks`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The caller, who will own the task
/// * `payload` - Title, subject, priority and optional due date
///
/// ### Returns
///
/// The newly created task as JSON
pub async fn create_task_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTaskDto>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    require_text("title", &payload.title)?;
    if payload.reminder_offset_minutes.is_some() && payload.due_date.is_none() {
        return Err(ApiError::Validation("A reminder needs a due date".to_string()));
    }

    let mut task = Task::new(
        user.user_id(),
        payload.title.trim().to_string(),
        payload.subject.trim().to_string(),
        payload.priority,
    );
    if let Some(due) = payload.due_date {
        task = task.with_due_date(due, payload.reminder_offset_minutes);
    }

    let task = repo::create_task(&pool, task)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for listing the caller's tasks
///
/// This function handles GET requests to `/tasks`, optionally filtered with
/// `?status=pending` or `?status=done`.
pub async fn list_tasks_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = repo::list_tasks(&pool, &user.user_id(), query.status)?;
    Ok(Json(tasks))
}

/// Handler for POST `/tasks/{id}/toggle`
pub async fn toggle_task_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let task = repo::toggle_task(&pool, &user.user_id(), &id)?.ok_or(ApiError::NotFound("Task"))?;
    Ok(Json(task))
}

/// Handler for DELETE `/tasks/{id}`
pub async fn delete_task_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if repo::delete_task(&pool, &user.user_id(), &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Task"))
    }
}

/// Handler for GET `/tasks/reminders`
///
/// Pending tasks whose reminder time is still ahead, soonest first. Clients
/// schedule the notifications themselves.
pub async fn list_reminders_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ReminderDto>>, ApiError> {
    let reminders = repo::upcoming_reminders(&pool, &user.user_id(), Utc::now())?
        .into_iter()
        .map(|(task, remind_at)| ReminderDto { task, remind_at })
        .collect();
    Ok(Json(reminders))
}
