use clap::ValueEnum;
use serde::Serialize;
use studymate::dto::{ChatTurnResponse, SessionResponse};
use studymate::models::{ChatSession, ScheduleEvent, Task};
use studymate::stats::Dashboard;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

fn lower_debug(value: impl std::fmt::Debug) -> String {
    format!("{:?}", value).to_lowercase()
}

/// Prints the result of register or login
///
/// Quiet mode prints only the session id, for
/// `export STUDYMATE_SESSION=$(studymate-cli -q session login ID)`.
pub fn print_session(session: &SessionResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", session.session_id);
                return;
            }
            println!("User:    {} ({})", session.profile.get_name(), session.profile.get_id());
            println!("Session: {}", session.session_id);
            println!("Streak:  {} day(s)", session.profile.get_streak());
            println!();
            println!("export STUDYMATE_SESSION={}", session.session_id);
        }
        OutputFormat::Json => print_json(session),
    }
}

/// Prints a list of tasks in the specified format
pub fn print_tasks(tasks: &[Task], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if tasks.is_empty() {
                if !config.quiet {
                    println!("No tasks found.");
                }
                return;
            }
            if config.quiet {
                for task in tasks {
                    println!("{}", task.get_id());
                }
                return;
            }
            let max_id = tasks.iter().map(|t| t.get_id().len()).max().unwrap_or(2);
            println!("{:<width$}  DONE  PRIORITY  SUBJECT       TITLE", "ID", width = max_id);
            for task in tasks {
                println!(
                    "{:<width$}  {:<4}  {:<8}  {:<12}  {}",
                    task.get_id(),
                    if task.is_done() { "[x]" } else { "[ ]" },
                    lower_debug(task.get_priority()),
                    task.get_subject(),
                    task.get_title(),
                    width = max_id,
                );
            }
        }
        OutputFormat::Json => print_json(tasks),
    }
}

/// Prints a single task in the specified format
pub fn print_task(task: &Task, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", task.get_id());
                return;
            }
            println!("ID:       {}", task.get_id());
            println!("Title:    {}", task.get_title());
            println!("Subject:  {}", task.get_subject());
            println!("Priority: {}", lower_debug(task.get_priority()));
            println!("Status:   {}", lower_debug(task.get_status()));
            if let Some(due) = task.get_due_date() {
                println!("Due:      {}", due);
            }
        }
        OutputFormat::Json => print_json(task),
    }
}

/// Prints calendar entries in the specified format
pub fn print_events(events: &[ScheduleEvent], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if events.is_empty() {
                if !config.quiet {
                    println!("No events found.");
                }
                return;
            }
            if config.quiet {
                for event in events {
                    println!("{}", event.get_id());
                }
                return;
            }
            for event in events {
                println!(
                    "{} {}  {:>4} min  {:<7} {} ({})",
                    event.get_date(),
                    event.get_start_time(),
                    event.get_duration_minutes(),
                    event.get_kind(),
                    event.get_title(),
                    event.get_subject(),
                );
            }
        }
        OutputFormat::Json => print_json(events),
    }
}

/// Prints the caller's conversations
pub fn print_chats(chats: &[ChatSession], config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if chats.is_empty() {
                if !config.quiet {
                    println!("No chats found.");
                }
                return;
            }
            if config.quiet {
                for chat in chats {
                    println!("{}", chat.get_id());
                }
                return;
            }
            let max_id = chats.iter().map(|c| c.get_id().len()).max().unwrap_or(2);
            println!("{:<width$}  TURNS  TITLE", "ID", width = max_id);
            for chat in chats {
                println!(
                    "{:<width$}  {:>5}  {}",
                    chat.get_id(),
                    chat.get_messages().len(),
                    chat.get_title(),
                    width = max_id,
                );
            }
        }
        OutputFormat::Json => print_json(chats),
    }
}

pub fn print_chat(chat: &ChatSession, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", chat.get_id());
                return;
            }
            println!("ID:    {}", chat.get_id());
            println!("Title: {}", chat.get_title());
        }
        OutputFormat::Json => print_json(chat),
    }
}

/// Prints the reply of a non-streamed chat turn
pub fn print_chat_turn(turn: &ChatTurnResponse, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => println!("{}", turn.reply),
        OutputFormat::Json => print_json(turn),
    }
}

/// Prints the dashboard summary
pub fn print_dashboard(dashboard: &Dashboard, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", dashboard.goal_progress_percent);
                return;
            }
            println!(
                "Tasks:     {}/{} done ({}%), {} high priority pending",
                dashboard.completed_tasks,
                dashboard.total_tasks,
                dashboard.completion_percent,
                dashboard.pending_high_priority,
            );
            println!(
                "Today:     {} of {} min ({}%)",
                dashboard.minutes_today, dashboard.daily_goal_minutes, dashboard.goal_progress_percent,
            );
            println!(
                "Total:     {} min over {} sessions",
                dashboard.total_study_minutes, dashboard.session_count,
            );
            println!(
                "Level {}   XP {}   Streak {}   Credits {}",
                dashboard.level, dashboard.xp, dashboard.streak, dashboard.credits,
            );
            let week: Vec<String> = dashboard.weekly_minutes.iter().map(|d| d.minutes.to_string()).collect();
            println!("Week:      {}", week.join(" "));
            if !dashboard.upcoming_events.is_empty() {
                println!();
                println!("Upcoming:");
                print_events(&dashboard.upcoming_events, config);
            }
        }
        OutputFormat::Json => print_json(dashboard),
    }
}

/// Prints a simple success message (for operations that don't return data)
pub fn print_success(message: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if !config.quiet {
                println!("{}", message);
            }
        }
        OutputFormat::Json => print_json(&serde_json::json!({"status": "ok", "message": message})),
    }
}
