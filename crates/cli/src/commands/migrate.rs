//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tienda-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded at
//! compile time.

use tienda_storefront::config::StorefrontConfig;
use tienda_storefront::db::Store;

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;

    tracing::info!("Connecting to storefront database...");
    let store = Store::connect(&config.database).await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations")
        .run(store.pool())
        .await?;

    store.close().await;
    tracing::info!("Storefront migrations complete");
    Ok(())
}
