use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{error, info};

use fs_waypoints::config::{ServerConfig, init_logging};
use fs_waypoints::mcp::{MCPServer, MCPTransport, SERVER_NAME, SERVER_VERSION, StdioTransport};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine
    dotenv::dotenv().ok();
    let config = ServerConfig::parse();

    let _guard = match init_logging(&config.log_level, config.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}: {}", SERVER_NAME, e);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{} stopped: {}", SERVER_NAME, e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    config.enter_working_dir()?;

    let locations = config.location_registry();
    if config.list_locations {
        println!("{}", serde_json::to_string_pretty(&locations.existing())?);
        return Ok(());
    }

    info!("Starting {} v{}", SERVER_NAME, SERVER_VERSION);
    info!("Working directory: {}", std::env::current_dir()?.display());
    for entry in locations.entries() {
        info!("Location {} -> {}", entry.name, entry.path.display());
    }

    let server = MCPServer::new(locations)?;
    let mut transport = StdioTransport::stdio();
    server.handle_connection(&mut transport).await?;
    transport.close().await?;

    info!("{} shut down", SERVER_NAME);
    Ok(())
}
