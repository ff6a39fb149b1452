//! # SQLite database methods
//!
//! "Low-level" SQLite interactions for the ledger. Everything here is a simple function (rather than a
//! stateful struct) that accepts a `&mut SqliteConnection`, so callers can obtain a connection from a pool or
//! open an atomic transaction and pass `&mut *tx` through without any other changes. The cross-entity
//! settlement transitions in [`super::SqliteDatabase`] are composed exactly that way.

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod notifications;
pub mod orders;
pub mod transactions;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqlxError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("🗃️ Ledger migrations complete");
    Ok(())
}
