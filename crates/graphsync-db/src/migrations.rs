//! Embedded schema migrations.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;

/// Compiled-in migrations from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply all pending migrations.
pub async fn run(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
