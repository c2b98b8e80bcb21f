//! Embedded Diesel migrations for the `records` table.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::RecordStoreError;

/// Migrations compiled from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply pending migrations against `database_url`.
///
/// Diesel's migration harness is synchronous, so the work runs on the
/// blocking pool.
///
/// # Errors
/// `Connection` when the database is unreachable, `Query` when a migration
/// fails.
pub async fn run_migrations(database_url: &str) -> Result<(), RecordStoreError> {
    let url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&url)
            .map_err(|err| RecordStoreError::connection(err.to_string()))?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| RecordStoreError::query(format!("migration failed: {err}")))?;
        for version in &applied {
            info!(%version, "applied migration");
        }
        Ok(())
    })
    .await
    .map_err(|err| RecordStoreError::query(format!("migration task failed: {err}")))?
}
