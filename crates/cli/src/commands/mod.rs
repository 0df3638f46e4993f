//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

use shopfloor_api::config::ApiConfig;
use shopfloor_api::db;

/// Connect to the database named by the API configuration.
async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let config = ApiConfig::from_env()?;
    let database_url: SecretString = config
        .database_url
        .ok_or("SHOPFLOOR_DATABASE_URL not set")?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
