use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use obrol::config::Config;
use obrol::conversation::ConversationStore;
use obrol::relay::RelayPolicy;
use obrol::web_server;

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port for the web server.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for environment variables like API keys)
    dotenvy::dotenv().ok();

    // Initialize tracing (logging) subscriber
    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,obrol=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    if config.api_key.is_some() {
        info!("Completion API configured: {} via {}", config.model, config.api_base);
    } else {
        info!("Running in demo mode (no OPENAI_API_KEY set)");
    }

    // One conversation store for the whole process, handed to the relay.
    let store = Arc::new(ConversationStore::new());
    let relay = Arc::new(
        RelayPolicy::new(&config, store).context("Failed to initialize relay policy")?,
    );

    // Start the web server in a separate asynchronous task
    let mut web_server_handle = tokio::spawn(async move {
        if let Err(e) = web_server::start_web_server(cli.port, relay).await {
            error!("Web server failed: {:?}", e);
        }
    });

    // Keep the main thread alive and wait for shutdown signals or task completion
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tokio::select! {
        // Wait for Ctrl-C signal for graceful shutdown
        _ = &mut ctrl_c => {
            info!("Ctrl-C received, initiating shutdown...");
        }
        // Handle potential completion/failure of the web server task
        res = &mut web_server_handle => {
            match res {
                Ok(_) => info!("Web server task completed unexpectedly."),
                // Handle JoinError (e.g., if the task panicked)
                Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                Err(e) => error!("Web server task failed: {:?}", e),
            }
        }
    }

    if !web_server_handle.is_finished() {
        info!("Aborting web server task...");
        web_server_handle.abort();
    }
    info!("Shutdown complete.");

    Ok(())
}
