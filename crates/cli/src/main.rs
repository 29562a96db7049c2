//! Nearby CLI - database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run site database migrations
//! nearby-cli migrate
//!
//! # Preview, then assign slugs for listings created before slugs existed
//! nearby-cli backfill-slugs --dry-run
//! nearby-cli backfill-slugs
//!
//! # Show which environment variables are set
//! nearby-cli check-env
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "nearby-cli")]
#[command(author, version, about = "Nearby CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Assign slugs to listings that have none
    BackfillSlugs {
        /// Log the slugs that would be assigned without writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Report which environment variables are set (never their values)
    CheckEnv,
}

#[tokio::main]
async fn main() {
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
        Commands::BackfillSlugs { dry_run } => {
            let summary = commands::slugs::backfill(dry_run).await?;
            tracing::info!(
                assigned = summary.assigned,
                skipped = summary.skipped,
                dry_run,
                "Slug backfill finished"
            );
        }
        Commands::CheckEnv => {
            let missing = commands::env::check();
            if !missing.is_empty() {
                return Err(format!("missing required variables: {}", missing.join(", ")).into());
            }
        }
    }
    Ok(())
}
