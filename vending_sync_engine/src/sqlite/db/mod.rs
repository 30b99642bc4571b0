//! # SQLite database methods
//!
//! Low-level SQLite interactions, maintained as simple functions (rather than stateful structs)
//! that accept a `&mut SqliteConnection`. Callers obtain a connection from a pool, or open a
//! transaction when a group of calls must be atomic, and pass `&mut *tx` straight through.
use std::env;

use log::info;
use sqlx::{migrate, sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod accounts;
pub mod machines;
pub mod orders;

const SQLITE_DB_URL: &str = "sqlite://data/vending_store.db";

pub fn db_url() -> String {
    let result = env::var("VGW_DATABASE_URL").unwrap_or_else(|_| {
        info!("VGW_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqlxError> {
    migrate!("./src/sqlite/migrations").run(pool).await?;
    info!("🗃️ Migrations complete");
    Ok(())
}
