use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use studymate::dto::GenerateScheduleDto;

use crate::client::StudymateClient;
use crate::output::{self, OutputConfig};

/// Calendar commands
#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    /// List calendar entries
    List {
        /// Only show this day (YYYY-MM-DD)
        #[clap(long)]
        date: Option<NaiveDate>,
    },
    /// Let the tutor plan a study day
    Generate {
        /// Day to plan (YYYY-MM-DD), defaults to today
        #[clap(long)]
        date: Option<NaiveDate>,
        /// Subjects to cover, can be specified multiple times
        #[clap(long = "subject", required = true)]
        subjects: Vec<String>,
        /// Hours available for studying
        #[clap(long)]
        hours: f32,
        /// What the day should achieve
        #[clap(long, default_value = "")]
        goal: String,
        /// First slot, HH:MM
        #[clap(long, default_value = "09:00")]
        start: String,
    },
}

/// Executes a schedule command
pub async fn execute(
    client: &StudymateClient,
    cmd: ScheduleCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ScheduleCommands::List { date } => {
            let events = client.list_events(date).await?;
            output::print_events(&events, config);
        }
        ScheduleCommands::Generate { date, subjects, hours, goal, start } => {
            let dto = GenerateScheduleDto {
                date: date.unwrap_or_else(|| Utc::now().date_naive()),
                goal,
                subjects,
                available_hours: hours,
                start_time: start,
            };
            let events = client.generate_schedule(&dto).await?;
            output::print_events(&events, config);
        }
    }
    Ok(())
}
