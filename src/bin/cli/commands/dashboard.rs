use crate::client::StudymateClient;
use crate::output::{self, OutputConfig};

/// Prints today's dashboard
pub async fn execute(client: &StudymateClient, config: &OutputConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = client.dashboard().await?;
    output::print_dashboard(&dashboard, config);
    Ok(())
}
