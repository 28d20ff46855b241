mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::StudymateClient;
use output::{OutputConfig, OutputFormat};
use std::process;
use studymate::config;

/// CLI for the studymate server
#[derive(Parser, Debug)]
#[clap(name = "studymate-cli", about = "CLI for the studymate study companion")]
struct Cli {
    /// Server URL to connect to
    #[clap(long, env = "STUDYMATE_URL", global = true)]
    server_url: Option<String>,

    /// Session id from `session login` or `session register`
    #[clap(long, env = "STUDYMATE_SESSION", global = true, hide_env_values = true)]
    session: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register, log in or log out
    #[command(subcommand)]
    Session(commands::session::SessionCommands),
    /// Manage tasks
    #[command(subcommand)]
    Task(commands::task::TaskCommands),
    /// View or generate the study calendar
    #[command(subcommand)]
    Schedule(commands::schedule::ScheduleCommands),
    /// Talk to the tutor
    #[command(subcommand)]
    Chat(commands::chat::ChatCommands),
    /// Show today's progress
    Dashboard,
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > the server's default port
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    // Try reading from config file
    if let Some(dir) = config::get_config_dir_path() {
        let config_path = dir.join("config.toml");
        if let Ok(update) = config::config_from_file(Some(config_path)) {
            if let Some(url) = update.server_url {
                return url;
            }
            if let Some(port) = update.port {
                return format!("http://localhost:{}", port);
            }
        }
    }

    format!("http://localhost:{}", config::DEFAULT_PORT)
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    // ClientError::Request wraps reqwest errors; check for connection issues
    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!("Could not connect to server. Is studymate running?\n  {}", err_string);
    }

    if err_string.starts_with("Server error (401)") {
        return format!("{}\n  Log in with `studymate-cli session login <USER_ID> --email <EMAIL>` and set STUDYMATE_SESSION", err_string);
    }

    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let client = StudymateClient::new(server_url, cli.session);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Session(cmd) => commands::session::execute(&client, cmd, &output_config).await,
        Commands::Task(cmd) => commands::task::execute(&client, cmd, &output_config).await,
        Commands::Schedule(cmd) => commands::schedule::execute(&client, cmd, &output_config).await,
        Commands::Chat(cmd) => commands::chat::execute(&client, cmd, &output_config).await,
        Commands::Dashboard => commands::dashboard::execute(&client, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
