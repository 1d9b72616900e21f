//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! nc-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CUSTOMER_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/service/migrations/` and are embedded into
//! the binary at compile time.

use niaga_customer_service::db;

use super::{CommandError, database_url};

/// Run customer database migrations.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to customer database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running customer migrations...");
    sqlx::migrate!("../service/migrations").run(&pool).await?;

    tracing::info!("Customer migrations complete!");
    Ok(())
}
