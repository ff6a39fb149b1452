use log::*;

use crate::{run_migrations, SqliteDatabase};

/// Creates a fresh, fully migrated in-memory ledger.
///
/// The pool is capped at one connection so that every query in a test sees the same in-memory database
/// (each new `sqlite::memory:` connection would otherwise be its own empty db).
pub async fn prepare_memory_db() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let db = SqliteDatabase::new_with_url("sqlite::memory:", 1).await.expect("Error creating in-memory database");
    run_migrations(db.pool()).await.expect("Error running DB migrations");
    info!("🚀️ In-memory ledger ready");
    db
}
