//! Database migration command.
//!
//! ```bash
//! nearby-cli migrate
//! ```
//!
//! Migrations live in `crates/site/migrations/` and are embedded in the site
//! library, so the CLI and the server always agree on the schema version.

use super::{CommandError, connect};

/// Run the site database migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running site migrations...");
    nearby_site::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Site migrations complete");
    Ok(())
}
