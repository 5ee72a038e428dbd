//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded at
//! compile time. The server never runs them on startup.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CliError, connect};

/// Run storefront migrations, then create the session store table.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
