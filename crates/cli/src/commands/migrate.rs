//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shopfloor migrate
//! ```
//!
//! # Migration Files
//!
//! Catalog, user and cart migrations: `crates/api/migrations/`. The session
//! table is created by `tower-sessions-sqlx-store` in its own schema.

use tower_sessions_sqlx_store::PostgresStore;

/// Run all database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or a
/// migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    tracing::info!("Running catalog migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Running session store migrations...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
