//! Postgres implementations of the storage contracts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use hoh_db::models::{FamilyMember, HouseholdPreferences, MealPlan};
use hoh_db::queries::{households, meal_plans, members, preferences};
use sqlx::PgPool;
use uuid::Uuid;

use super::{HouseholdStore, PlanStore, Requester};
use crate::diet::DietaryNeeds;

/// Store backed by the `hoh-db` query layer.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HouseholdStore for PgStore {
    async fn preferences(&self, household_id: Uuid) -> Result<HouseholdPreferences> {
        let prefs = preferences::get_preferences(&self.pool, household_id).await?;
        Ok(prefs.unwrap_or_default())
    }

    async fn members(&self, household_id: Uuid) -> Result<Vec<FamilyMember>> {
        members::list_members(&self.pool, household_id).await
    }

    async fn requester(&self, user_id: &str) -> Result<Option<Requester>> {
        let profile = households::get_user_profile(&self.pool, user_id).await?;
        Ok(profile.map(|p| Requester {
            needs: DietaryNeeds::new(&p.dietary_restrictions, &p.allergies),
            user_id: p.user_id,
            household_id: p.household_id,
        }))
    }
}

#[async_trait]
impl PlanStore for PgStore {
    async fn get(&self, household_id: Uuid, start_date: NaiveDate) -> Result<Option<MealPlan>> {
        meal_plans::get_plan(&self.pool, household_id, start_date).await
    }

    async fn put(&self, plan: &MealPlan) -> Result<()> {
        meal_plans::upsert_plan(&self.pool, plan).await
    }

    async fn current(&self, household_id: Uuid, today: NaiveDate) -> Result<Option<MealPlan>> {
        if let Some(plan) = meal_plans::get_plan_covering(&self.pool, household_id, today).await? {
            return Ok(Some(plan));
        }
        meal_plans::get_latest_plan(&self.pool, household_id).await
    }
}
