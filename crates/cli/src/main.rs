//! Niaga Customer CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run customer database migrations
//! nc-cli migrate
//!
//! # Delete back-in-stock subscriptions notified more than 30 days ago
//! nc-cli cleanup-notified --older-than-days 30
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `cleanup-notified` - Delete old notified back-in-stock subscriptions

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use niaga_customer_service::services::back_in_stock::DEFAULT_CLEANUP_DAYS;

mod commands;

#[derive(Parser)]
#[command(name = "nc-cli")]
#[command(author, version, about = "Niaga customer service CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Delete back-in-stock subscriptions notified long ago
    CleanupNotified {
        /// Minimum age of the notification, in days
        #[arg(long, default_value_t = DEFAULT_CLEANUP_DAYS)]
        older_than_days: u32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::CleanupNotified { older_than_days } => {
            commands::cleanup::notified(older_than_days).await?;
        }
    }
    Ok(())
}
