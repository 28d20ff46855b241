//! Dashboard figures derived in memory from a user's collections

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db::DbPool;
use crate::models::{Priority, ScheduleEvent, StudySession, Task, UserProfile};
use crate::repo;

/// How many upcoming events the dashboard shows
pub const UPCOMING_EVENT_LIMIT: usize = 5;

/// Days covered by the weekly chart, today included
pub const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMinutes {
    pub date: NaiveDate,
    pub minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMinutes {
    pub subject: String,
    pub minutes: u64,
}

/// Everything the dashboard page displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Rounded to the nearest whole percent; 0 with no tasks
    pub completion_percent: u32,
    pub pending_high_priority: usize,
    pub total_study_minutes: u64,
    pub minutes_today: u64,
    /// Oldest day first
    pub weekly_minutes: Vec<DailyMinutes>,
    /// Most studied subject first
    pub subject_minutes: Vec<SubjectMinutes>,
    pub session_count: usize,
    pub upcoming_events: Vec<ScheduleEvent>,
    pub daily_goal_minutes: u32,
    /// Capped at 100
    pub goal_progress_percent: u32,
    pub xp: u64,
    pub level: u64,
    pub streak: u32,
    pub credits: u64,
}

fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let value = (part as f64 * 100.0 / whole as f64).round();
    value.min(u32::MAX as f64) as u32
}

/// Derives the dashboard from already-loaded collections
pub fn compute_dashboard(
    profile: &UserProfile,
    tasks: &[Task],
    sessions: &[StudySession],
    events: &[ScheduleEvent],
    today: NaiveDate,
) -> Dashboard {
    let completed_tasks = tasks.iter().filter(|t| t.is_done()).count();
    let pending_high_priority = tasks
        .iter()
        .filter(|t| !t.is_done() && t.get_priority() == Priority::High)
        .count();

    let minutes_on = |date: NaiveDate| -> u64 {
        sessions
            .iter()
            .filter(|s| s.get_date() == date)
            .map(|s| u64::from(s.get_duration_minutes()))
            .sum()
    };

    let total_study_minutes: u64 = sessions.iter().map(|s| u64::from(s.get_duration_minutes())).sum();
    let minutes_today = minutes_on(today);

    let weekly_minutes = (0..WEEK_DAYS)
        .rev()
        .map(|back| today - Duration::days(back))
        .map(|date| DailyMinutes { date, minutes: minutes_on(date) })
        .collect();

    let mut by_subject: HashMap<String, u64> = HashMap::new();
    for session in sessions {
        *by_subject.entry(session.get_subject()).or_default() += u64::from(session.get_duration_minutes());
    }
    let mut subject_minutes: Vec<SubjectMinutes> = by_subject
        .into_iter()
        .map(|(subject, minutes)| SubjectMinutes { subject, minutes })
        .collect();
    subject_minutes.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.subject.cmp(&b.subject)));

    let mut upcoming_events: Vec<ScheduleEvent> = events.iter().filter(|e| e.get_date() >= today).cloned().collect();
    upcoming_events.sort_by_key(|e| (e.get_date(), e.start_time_of_day()));
    upcoming_events.truncate(UPCOMING_EVENT_LIMIT);

    let daily_goal_minutes = profile.get_daily_goal_minutes();
    let goal_progress_percent = if daily_goal_minutes == 0 {
        100
    } else {
        percent(minutes_today, u64::from(daily_goal_minutes)).min(100)
    };

    Dashboard {
        total_tasks: tasks.len(),
        completed_tasks,
        completion_percent: percent(completed_tasks as u64, tasks.len() as u64),
        pending_high_priority,
        total_study_minutes,
        minutes_today,
        weekly_minutes,
        subject_minutes,
        session_count: sessions.len(),
        upcoming_events,
        daily_goal_minutes,
        goal_progress_percent,
        xp: profile.get_xp(),
        level: profile.level(),
        streak: profile.get_streak(),
        credits: profile.get_credits(),
    }
}

/// Runs a store query on the blocking pool
async fn blocking<T, F>(pool: Arc<DbPool>, query: F) -> Result<T>
where
    F: FnOnce(&DbPool) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || query(&pool))
        .await
        .context("Dashboard query task failed")?
}

/// Loads a user's collections concurrently and derives the dashboard
///
/// ### Errors
///
/// Returns the first failure among the four loads; no partial dashboard is
/// produced
#[instrument(skip(pool))]
pub async fn load_dashboard(pool: Arc<DbPool>, user_id: String, today: NaiveDate) -> Result<Dashboard> {
    let (profile, tasks, sessions, events) = tokio::try_join!(
        blocking(pool.clone(), {
            let user_id = user_id.clone();
            move |pool| repo::get_profile(pool, &user_id)
        }),
        blocking(pool.clone(), {
            let user_id = user_id.clone();
            move |pool| repo::list_tasks(pool, &user_id, None)
        }),
        blocking(pool.clone(), {
            let user_id = user_id.clone();
            move |pool| repo::list_study_sessions(pool, &user_id)
        }),
        blocking(pool.clone(), {
            let user_id = user_id.clone();
            move |pool| repo::list_events(pool, &user_id, None)
        }),
    )?;

    let profile = profile.ok_or_else(|| anyhow!("Profile {} not found", user_id))?;
    debug!(
        tasks = tasks.len(),
        sessions = sessions.len(),
        events = events.len(),
        "Loaded dashboard inputs"
    );
    Ok(compute_dashboard(&profile, &tasks, &sessions, &events, today))
}
