//! Connection pool construction and migration runner.
//!
//! Grounded in the teacher's `database::init` (same `r2d2` + embedded-migrations
//! idiom), adapted from a Tauri `AppHandle`-resolved app-data directory to a
//! plain file path, since this runtime has no desktop shell to ask.

use std::path::Path;

use diesel::r2d2::{self, ConnectionManager};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database initialization error: {0}")]
    Init(String),
    #[error("database migration error: {0}")]
    Migration(String),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::Error),
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
}

/// Opens (creating if absent) a SQLite database at `path`, runs pending
/// migrations, and returns a pooled handle. `path` may be `:memory:` for
/// an ephemeral, process-local database (used by tests and by callers
/// that want persistence's write-through discipline without a file).
pub fn init(path: &Path) -> Result<DbPool, DbError> {
    let db_url = path.to_string_lossy().to_string();

    if db_url != ":memory:"
        && let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| DbError::Init(format!("failed to create data directory: {e}")))?;
    }

    tracing::info!("initializing persistence store at {db_url}");

    let manager = ConnectionManager::<SqliteConnection>::new(&db_url);
    let pool = r2d2::Pool::builder()
        .max_size(10)
        .build(manager)
        .map_err(|e| DbError::Init(format!("failed to build connection pool: {e}")))?;

    let mut conn = pool.get().map_err(|e| DbError::Init(format!("failed to get connection: {e}")))?;
    conn.run_pending_migrations(MIGRATIONS).map_err(|e| DbError::Migration(e.to_string()))?;

    Ok(pool)
}
