//! Database query functions for the `family_members` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{FamilyMember, RecurringMeals};

const SELECT_COLUMNS: &str = "id, household_id, name, age, dietary_restrictions, allergies, \
                              shares_adult_meals, breakfast_meals, lunch_meals, dinner_meals, \
                              snack_meals";

/// Parameters for inserting a new family member.
#[derive(Debug, Clone)]
pub struct NewMember<'a> {
    pub household_id: Uuid,
    pub name: &'a str,
    pub age: Option<i32>,
    pub dietary_restrictions: &'a [String],
    pub allergies: &'a [String],
    pub shares_adult_meals: bool,
    pub recurring: &'a RecurringMeals,
}

/// Insert a family member. Returns the row with its generated id.
pub async fn insert_member(pool: &PgPool, new: &NewMember<'_>) -> Result<FamilyMember> {
    let query = format!(
        "INSERT INTO family_members \
             (household_id, name, age, dietary_restrictions, allergies, shares_adult_meals, \
              breakfast_meals, lunch_meals, dinner_meals, snack_meals) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {SELECT_COLUMNS}"
    );
    let member = sqlx::query_as::<_, FamilyMember>(&query)
        .bind(new.household_id)
        .bind(new.name)
        .bind(new.age)
        .bind(new.dietary_restrictions)
        .bind(new.allergies)
        .bind(new.shares_adult_meals)
        .bind(&new.recurring.breakfast)
        .bind(&new.recurring.lunch)
        .bind(&new.recurring.dinner)
        .bind(&new.recurring.snacks)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to insert member {:?}", new.name))?;

    Ok(member)
}

/// List a household's members in insertion order.
pub async fn list_members(pool: &PgPool, household_id: Uuid) -> Result<Vec<FamilyMember>> {
    let query = format!(
        "SELECT {SELECT_COLUMNS} FROM family_members \
         WHERE household_id = $1 \
         ORDER BY created_at, name"
    );
    let members = sqlx::query_as::<_, FamilyMember>(&query)
        .bind(household_id)
        .fetch_all(pool)
        .await
        .context("failed to list family members")?;

    Ok(members)
}

/// Remove a member from a household. Fails if the member does not exist.
pub async fn delete_member(pool: &PgPool, household_id: Uuid, member_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM family_members WHERE id = $1 AND household_id = $2")
        .bind(member_id)
        .bind(household_id)
        .execute(pool)
        .await
        .context("failed to delete family member")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("member {member_id} not found in household {household_id}");
    }

    Ok(())
}
