//! Back-in-stock maintenance.
//!
//! # Usage
//!
//! ```bash
//! nc-cli cleanup-notified --older-than-days 30
//! ```

use std::sync::Arc;

use niaga_customer_service::db::{self, PgStore};
use niaga_customer_service::services::BackInStockRegistry;

use super::{CommandError, database_url};

/// Delete subscriptions notified more than `older_than_days` ago.
pub async fn notified(older_than_days: u32) -> Result<u64, CommandError> {
    let database_url = database_url()?;
    let pool = db::create_pool(&database_url).await?;
    let registry = BackInStockRegistry::new(Arc::new(PgStore::new(pool)));

    let deleted = registry.delete_old_notified(older_than_days).await?;
    tracing::info!(deleted, older_than_days, "Cleanup complete");
    Ok(deleted)
}
