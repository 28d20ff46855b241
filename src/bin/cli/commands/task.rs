use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use studymate::dto::CreateTaskDto;
use studymate::models::{Priority, TaskStatus};

use crate::client::StudymateClient;
use crate::output::{self, OutputConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    Done,
}

impl From<StatusArg> for TaskStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => TaskStatus::Pending,
            StatusArg::Done => TaskStatus::Done,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

/// Task commands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks
    List {
        /// Only show tasks with this status
        #[clap(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Create a new task
    Create {
        /// The title of the task
        title: String,
        /// Subject the task belongs to
        #[clap(long, default_value = "")]
        subject: String,
        #[clap(long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
        /// Due date in RFC 3339 format, e.g. 2025-06-01T17:00:00Z
        #[clap(long)]
        due: Option<DateTime<Utc>>,
        /// Minutes before the due date to be reminded
        #[clap(long, requires = "due")]
        remind: Option<u32>,
    },
    /// Mark a task done, or pending again
    Toggle {
        /// The task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// The task ID
        id: String,
    },
}

/// Executes a task command
pub async fn execute(
    client: &StudymateClient,
    cmd: TaskCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        TaskCommands::List { status } => {
            let tasks = client.list_tasks(status.map(TaskStatus::from)).await?;
            output::print_tasks(&tasks, config);
        }
        TaskCommands::Create { title, subject, priority, due, remind } => {
            let dto = CreateTaskDto {
                title,
                subject,
                priority: priority.into(),
                due_date: due,
                reminder_offset_minutes: remind,
            };
            let task = client.create_task(&dto).await?;
            output::print_task(&task, config);
        }
        TaskCommands::Toggle { id } => {
            let task = client.toggle_task(&id).await?;
            output::print_task(&task, config);
        }
        TaskCommands::Delete { id } => {
            client.delete_task(&id).await?;
            output::print_success(&format!("Deleted task {}", id), config);
        }
    }
    Ok(())
}
