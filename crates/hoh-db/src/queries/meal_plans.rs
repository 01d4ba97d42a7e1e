//! Database query functions for the `meal_plans` table.
//!
//! Plans are whole documents keyed by `(household_id, start_date)`. Writes
//! replace the entire row (last write wins). Rows past `expires_at` are
//! invisible to every read.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::MealPlan;

const SELECT_COLUMNS: &str = "household_id, start_date, end_date, slots, mode, generated_by, \
                              generated_at, updated_at, expires_at";

/// Insert or fully overwrite the plan for `(household_id, start_date)`.
pub async fn upsert_plan(pool: &PgPool, plan: &MealPlan) -> Result<()> {
    sqlx::query(
        "INSERT INTO meal_plans \
             (household_id, start_date, end_date, slots, mode, generated_by, \
              generated_at, updated_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (household_id, start_date) DO UPDATE SET \
             end_date = EXCLUDED.end_date, \
             slots = EXCLUDED.slots, \
             mode = EXCLUDED.mode, \
             generated_by = EXCLUDED.generated_by, \
             generated_at = EXCLUDED.generated_at, \
             updated_at = EXCLUDED.updated_at, \
             expires_at = EXCLUDED.expires_at",
    )
    .bind(plan.household_id)
    .bind(plan.start_date)
    .bind(plan.end_date)
    .bind(Json(&plan.slots))
    .bind(plan.mode)
    .bind(&plan.generated_by)
    .bind(plan.generated_at)
    .bind(plan.updated_at)
    .bind(plan.expires_at)
    .execute(pool)
    .await
    .with_context(|| {
        format!(
            "failed to save meal plan for household {} week {}",
            plan.household_id, plan.start_date
        )
    })?;

    Ok(())
}

/// Fetch the unexpired plan starting on `start_date`.
pub async fn get_plan(
    pool: &PgPool,
    household_id: Uuid,
    start_date: NaiveDate,
) -> Result<Option<MealPlan>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM meal_plans \
         WHERE household_id = $1 AND start_date = $2 AND expires_at > now()"
    );
    let plan = sqlx::query_as::<_, MealPlan>(&query)
        .bind(household_id)
        .bind(start_date)
        .fetch_optional(pool)
        .await
        .context("failed to fetch meal plan")?;

    Ok(plan)
}

/// Fetch the unexpired plan whose week contains `date`, preferring the
/// latest start date when weeks overlap.
pub async fn get_plan_covering(
    pool: &PgPool,
    household_id: Uuid,
    date: NaiveDate,
) -> Result<Option<MealPlan>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM meal_plans \
         WHERE household_id = $1 AND start_date <= $2 AND end_date >= $2 \
           AND expires_at > now() \
         ORDER BY start_date DESC \
         LIMIT 1"
    );
    let plan = sqlx::query_as::<_, MealPlan>(&query)
        .bind(household_id)
        .bind(date)
        .fetch_optional(pool)
        .await
        .context("failed to fetch meal plan covering date")?;

    Ok(plan)
}

/// Fetch the unexpired plan with the latest start date.
pub async fn get_latest_plan(pool: &PgPool, household_id: Uuid) -> Result<Option<MealPlan>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM meal_plans \
         WHERE household_id = $1 AND expires_at > now() \
         ORDER BY start_date DESC \
         LIMIT 1"
    );
    let plan = sqlx::query_as::<_, MealPlan>(&query)
        .bind(household_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch latest meal plan")?;

    Ok(plan)
}

/// Delete every expired plan. Returns the number of rows removed.
pub async fn delete_expired_plans(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM meal_plans WHERE expires_at <= now()")
        .execute(pool)
        .await
        .context("failed to delete expired meal plans")?;

    Ok(result.rows_affected())
}
