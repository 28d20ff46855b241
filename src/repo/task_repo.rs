use crate::db::DbPool;
use crate::models::{Task, TaskStatus};
use crate::repo::document_repo;
use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

/// Stores a newly created task
#[instrument(skip(pool, task), fields(task_id = %task.get_id()))]
pub fn create_task(pool: &DbPool, task: Task) -> Result<Task> {
    document_repo::put(pool, &task)?;
    info!("Created task");
    Ok(task)
}

/// Lists a user's tasks, newest first, optionally filtered by status
#[instrument(skip(pool))]
pub fn list_tasks(pool: &DbPool, owner_id: &str, status: Option<TaskStatus>) -> Result<Vec<Task>> {
    let mut tasks: Vec<Task> = document_repo::list_by_owner(pool, owner_id)?;
    if let Some(status) = status {
        tasks.retain(|t| t.get_status() == status);
    }
    tasks.sort_by(|a, b| b.get_created_at().cmp(&a.get_created_at()));
    Ok(tasks)
}

/// Fetches a task only if it belongs to `owner_id`
#[instrument(skip(pool))]
pub fn get_task(pool: &DbPool, owner_id: &str, task_id: &str) -> Result<Option<Task>> {
    let task: Option<Task> = document_repo::get(pool, task_id)?;
    Ok(task.filter(|t| t.get_owner_id() == owner_id))
}

/// Flips a task between pending and done
///
/// ### Returns
///
/// The updated task, or None if the user has no such task
#[instrument(skip(pool))]
pub fn toggle_task(pool: &DbPool, owner_id: &str, task_id: &str) -> Result<Option<Task>> {
    let Some(mut task) = get_task(pool, owner_id, task_id)? else {
        return Ok(None);
    };
    task.toggle();
    document_repo::put(pool, &task)?;
    info!("Task is now {:?}", task.get_status());
    Ok(Some(task))
}

/// Deletes a task owned by `owner_id`
///
/// ### Returns
///
/// `true` if the task existed and was deleted
#[instrument(skip(pool))]
pub fn delete_task(pool: &DbPool, owner_id: &str, task_id: &str) -> Result<bool> {
    if get_task(pool, owner_id, task_id)?.is_none() {
        return Ok(false);
    }
    document_repo::delete::<Task>(pool, task_id)
}

/// Pending tasks whose reminder time is still ahead of `now`, soonest first
#[instrument(skip(pool))]
pub fn upcoming_reminders(pool: &DbPool, owner_id: &str, now: DateTime<Utc>) -> Result<Vec<(Task, DateTime<Utc>)>> {
    let tasks = list_tasks(pool, owner_id, Some(TaskStatus::Pending))?;
    let mut reminders: Vec<_> = tasks
        .into_iter()
        .filter_map(|t| t.reminder_at().map(|at| (t, at)))
        .filter(|(_, at)| *at > now)
        .collect();
    reminders.sort_by_key(|(_, at)| *at);
    Ok(reminders)
}
