use diesel::{Connection, PgConnection};
use diesel_async::{AsyncPgConnection, pooled_connection::AsyncDieselConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::utils::Pool;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

pub async fn get_pool(db_url: &str) -> Result<Pool, String> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    let pool = bb8::Pool::builder()
        .build(config)
        .await
        .map_err(|e| format!("Failed to create db pool: {}", e))?;

    Ok(pool)
}

/// A pool that connects on first use. Routes that fail before touching the
/// database work without a server behind `db_url`.
pub fn lazy_pool(db_url: &str) -> Pool {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    bb8::Pool::builder().build_unchecked(config)
}

pub async fn run_migrations(db_url: String) -> Result<(), String> {
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&db_url)
            .map_err(|e| format!("failed to connect to database: {}", e))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| format!("Failed to run migrations: {}", e))?;
        for version in applied {
            tracing::info!(%version, "applied migration");
        }
        Ok(())
    })
    .await
    .map_err(|e| format!("Migration task failed: {}", e))?
}
