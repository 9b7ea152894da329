//! Schema migrations for the customer and document tables.

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use casefile_core::{AppError, AppResult, ErrorKind};

/// Embedded migrations from the workspace `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// A migration applied by [`run_migrations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
}

/// Apply pending migrations and return the ones that ran, oldest first.
pub async fn run_migrations(pool: &PgPool) -> AppResult<Vec<AppliedMigration>> {
    let before = applied_versions(pool).await?;

    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            format!("Failed to run migrations: {e}"),
            e,
        )
    })?;

    let applied = newly_applied(&before);
    for migration in &applied {
        info!(version = migration.version, description = %migration.description, "Applied migration");
    }
    if applied.is_empty() {
        info!("Database schema up to date");
    }
    Ok(applied)
}

/// Versions already recorded in the sqlx bookkeeping table. Empty on a
/// fresh database.
async fn applied_versions(pool: &PgPool) -> AppResult<HashSet<i64>> {
    let has_table: bool =
        sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check migrations table", e))?;
    if !has_table {
        return Ok(HashSet::new());
    }
    let versions: Vec<i64> =
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success")
            .fetch_all(pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read applied migrations", e))?;
    Ok(versions.into_iter().collect())
}

fn newly_applied(before: &HashSet<i64>) -> Vec<AppliedMigration> {
    MIGRATOR
        .iter()
        .filter(|m| !m.migration_type.is_down_migration() && !before.contains(&m.version))
        .map(|m| AppliedMigration {
            version: m.version,
            description: m.description.to_string(),
        })
        .collect()
}
