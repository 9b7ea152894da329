//! Database migration command.

use casefile_core::AppResult;

use super::Context;
use crate::output;

/// Apply all pending migrations
pub async fn execute(ctx: &Context) -> AppResult<()> {
    println!("Running database migrations...");
    let applied = casefile_database::migration::run_migrations(ctx.pool.pool()).await?;
    if applied.is_empty() {
        output::print_success("Schema already up to date.");
        return Ok(());
    }
    for migration in &applied {
        println!("  {} {}", migration.version, migration.description);
    }
    output::print_success(&format!("Applied {} migration(s).", applied.len()));
    Ok(())
}
