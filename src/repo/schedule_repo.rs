use crate::db::DbPool;
use crate::models::ScheduleEvent;
use crate::repo::document_repo;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, instrument};

#[instrument(skip(pool, event), fields(event_id = %event.get_id()))]
pub fn create_event(pool: &DbPool, event: ScheduleEvent) -> Result<ScheduleEvent> {
    document_repo::put(pool, &event)?;
    Ok(event)
}

/// Lists a user's events in calendar order, optionally for one day
#[instrument(skip(pool))]
pub fn list_events(pool: &DbPool, owner_id: &str, date: Option<NaiveDate>) -> Result<Vec<ScheduleEvent>> {
    let mut events: Vec<ScheduleEvent> = document_repo::list_by_owner(pool, owner_id)?;
    if let Some(date) = date {
        events.retain(|e| e.get_date() == date);
    }
    events.sort_by_key(|e| (e.get_date(), e.start_time_of_day()));
    Ok(events)
}

/// Deletes an event owned by `owner_id`
#[instrument(skip(pool))]
pub fn delete_event(pool: &DbPool, owner_id: &str, event_id: &str) -> Result<bool> {
    let event: Option<ScheduleEvent> = document_repo::get(pool, event_id)?;
    match event {
        Some(e) if e.get_owner_id() == owner_id => document_repo::delete::<ScheduleEvent>(pool, event_id),
        _ => Ok(false),
    }
}

/// Persists a generated plan as one all-or-nothing batch
#[instrument(skip(pool, events), fields(count = events.len()))]
pub fn save_generated_events(pool: &DbPool, events: &[ScheduleEvent]) -> Result<()> {
    document_repo::put_all(pool, events)?;
    info!("Saved generated schedule");
    Ok(())
}
