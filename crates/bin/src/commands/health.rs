//! Health check command - checks a running Hub Chantier server.

use crate::cli::ServerArgs;
use crate::commands::build_client;

/// Run the health check command
pub async fn run(server: &ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_client(server)?;

    match client.health().await {
        Ok(health) if health.is_healthy() => {
            println!("healthy: {}", client.base_url());
            Ok(())
        }
        Ok(health) => {
            eprintln!("unhealthy: server reported status '{}'", health.status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("unhealthy: {e}");
            std::process::exit(1);
        }
    }
}
