use clap::Subcommand;

use crate::client::StudymateClient;
use crate::output::{self, OutputConfig};

/// Session management commands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Create a new user and log in as them
    Register {
        /// Display name
        #[clap(long)]
        name: String,
        /// Contact email
        #[clap(long)]
        email: String,
    },
    /// Log in as an existing user
    Login {
        /// The user ID
        user_id: String,
        /// The email the user registered with
        #[clap(long)]
        email: String,
    },
    /// End the current session
    Logout,
}

/// Executes a session command
pub async fn execute(
    client: &StudymateClient,
    cmd: SessionCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        SessionCommands::Register { name, email } => {
            let session = client.register(name, email).await?;
            output::print_session(&session, config);
        }
        SessionCommands::Login { user_id, email } => {
            let session = client.login(user_id, email).await?;
            output::print_session(&session, config);
        }
        SessionCommands::Logout => {
            client.logout().await?;
            output::print_success("Logged out", config);
        }
    }
    Ok(())
}
