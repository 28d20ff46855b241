use clap::Subcommand;
use std::io::Write;

use crate::client::StudymateClient;
use crate::output::{self, OutputConfig, OutputFormat};

/// Tutoring chat commands
#[derive(Subcommand, Debug)]
pub enum ChatCommands {
    /// List conversations
    List,
    /// Start an empty conversation
    New {
        /// Conversation title
        #[clap(long)]
        title: Option<String>,
    },
    /// Send a message and print the tutor's reply
    Send {
        /// The chat ID
        chat_id: String,
        /// The message text
        text: String,
        /// Print the reply as it is written; Ctrl-C abandons it
        #[clap(long)]
        stream: bool,
    },
}

/// Executes a chat command
pub async fn execute(
    client: &StudymateClient,
    cmd: ChatCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ChatCommands::List => {
            let chats = client.list_chats().await?;
            output::print_chats(&chats, config);
        }
        ChatCommands::New { title } => {
            let chat = client.create_chat(title).await?;
            output::print_chat(&chat, config);
        }
        ChatCommands::Send { chat_id, text, stream: false } => {
            let turn = client.send_message(&chat_id, text).await?;
            output::print_chat_turn(&turn, config);
        }
        ChatCommands::Send { chat_id, text, stream: true } => {
            let human = config.format == OutputFormat::Human;
            let streaming = client.stream_message(&chat_id, text, |fragment| {
                if human {
                    print!("{}", fragment);
                    let _ = std::io::stdout().flush();
                }
            });

            tokio::select! {
                done = streaming => {
                    let done = done?;
                    if human {
                        println!();
                    } else {
                        println!("{}", serde_json::to_string_pretty(&done)?);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    // Dropping the request closes the connection; nothing is saved
                    eprintln!();
                    eprintln!("Cancelled, reply discarded");
                }
            }
        }
    }
    Ok(())
}
