//! Database query functions for the `household_preferences` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::HouseholdPreferences;

const SELECT_COLUMNS: &str = "mode, cooking_time, meal_types, breakfast_meals, lunch_meals, \
                              dinner_meals, snack_meals, notes";

/// Fetch a household's preferences, if any have been saved.
pub async fn get_preferences(
    pool: &PgPool,
    household_id: Uuid,
) -> Result<Option<HouseholdPreferences>> {
    let query =
        format!("SELECT {SELECT_COLUMNS} FROM household_preferences WHERE household_id = $1");
    let prefs = sqlx::query_as::<_, HouseholdPreferences>(&query)
        .bind(household_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch household preferences")?;

    Ok(prefs)
}

/// Insert or fully replace a household's preferences.
pub async fn upsert_preferences(
    pool: &PgPool,
    household_id: Uuid,
    prefs: &HouseholdPreferences,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO household_preferences \
             (household_id, mode, cooking_time, meal_types, breakfast_meals, lunch_meals, \
              dinner_meals, snack_meals, notes, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now()) \
         ON CONFLICT (household_id) DO UPDATE SET \
             mode = EXCLUDED.mode, \
             cooking_time = EXCLUDED.cooking_time, \
             meal_types = EXCLUDED.meal_types, \
             breakfast_meals = EXCLUDED.breakfast_meals, \
             lunch_meals = EXCLUDED.lunch_meals, \
             dinner_meals = EXCLUDED.dinner_meals, \
             snack_meals = EXCLUDED.snack_meals, \
             notes = EXCLUDED.notes, \
             updated_at = now()",
    )
    .bind(household_id)
    .bind(prefs.mode)
    .bind(prefs.cooking_time)
    .bind(&prefs.meal_types)
    .bind(&prefs.recurring.breakfast)
    .bind(&prefs.recurring.lunch)
    .bind(&prefs.recurring.dinner)
    .bind(&prefs.recurring.snacks)
    .bind(&prefs.notes)
    .execute(pool)
    .await
    .with_context(|| format!("failed to save preferences for household {household_id}"))?;

    Ok(())
}
