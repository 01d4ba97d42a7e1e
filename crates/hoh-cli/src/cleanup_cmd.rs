//! `hoh cleanup` command: delete expired meal plans.
//!
//! Expired plans are already invisible to every read; this only reclaims
//! the rows.

use anyhow::Result;
use sqlx::PgPool;

use hoh_db::queries::meal_plans;

/// Run the cleanup command.
pub async fn run_cleanup(pool: &PgPool) -> Result<()> {
    let removed = meal_plans::delete_expired_plans(pool).await?;
    tracing::info!(removed, "deleted expired meal plans");
    println!("Cleanup complete: {removed} expired plan(s) removed.");
    Ok(())
}
