//! Database query functions for the `households` and `user_profiles` tables.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Household, UserProfile};

/// Insert a new household. Returns the row with its generated id.
pub async fn insert_household(pool: &PgPool, name: &str) -> Result<Household> {
    let household = sqlx::query_as::<_, Household>(
        "INSERT INTO households (name) VALUES ($1) RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .context("failed to insert household")?;

    Ok(household)
}

/// Fetch a household by its ID.
pub async fn get_household(pool: &PgPool, id: Uuid) -> Result<Option<Household>> {
    let household = sqlx::query_as::<_, Household>("SELECT * FROM households WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch household")?;

    Ok(household)
}

/// Link a user to a household, replacing any previous link.
pub async fn upsert_user_profile(
    pool: &PgPool,
    user_id: &str,
    household_id: Uuid,
    dietary_restrictions: &[String],
    allergies: &[String],
) -> Result<UserProfile> {
    let profile = sqlx::query_as::<_, UserProfile>(
        "INSERT INTO user_profiles (user_id, household_id, dietary_restrictions, allergies) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id) DO UPDATE SET \
             household_id = EXCLUDED.household_id, \
             dietary_restrictions = EXCLUDED.dietary_restrictions, \
             allergies = EXCLUDED.allergies \
         RETURNING *",
    )
    .bind(user_id)
    .bind(household_id)
    .bind(dietary_restrictions)
    .bind(allergies)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to link user {user_id:?} to household {household_id}"))?;

    Ok(profile)
}

/// Fetch the profile of an authenticated user.
pub async fn get_user_profile(pool: &PgPool, user_id: &str) -> Result<Option<UserProfile>> {
    let profile =
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user profile")?;

    Ok(profile)
}
