//! Storage contracts consumed by the plan builder and swap engine.
//!
//! The engine only reads household configuration and reads/writes whole
//! plan documents. Both traits are object-safe and stored as `Arc<dyn ..>`
//! so tests can substitute in-memory fakes.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use hoh_db::models::{FamilyMember, HouseholdPreferences, MealPlan};
use uuid::Uuid;

use crate::diet::DietaryNeeds;

pub use postgres::PgStore;

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: String,
    pub household_id: Uuid,
    /// The caller's own restrictions and allergies.
    pub needs: DietaryNeeds,
}

/// Read-only view of household configuration.
#[async_trait]
pub trait HouseholdStore: Send + Sync {
    /// Preferences for a household, or defaults when none were saved.
    async fn preferences(&self, household_id: Uuid) -> Result<HouseholdPreferences>;

    /// Members of a household in a stable order.
    async fn members(&self, household_id: Uuid) -> Result<Vec<FamilyMember>>;

    /// Resolve a user id to their household and dietary needs.
    async fn requester(&self, user_id: &str) -> Result<Option<Requester>>;
}

/// Whole-document plan persistence keyed by `(household_id, start_date)`.
///
/// Expired plans are invisible to every read.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn get(&self, household_id: Uuid, start_date: NaiveDate) -> Result<Option<MealPlan>>;

    /// Insert or fully overwrite. Last write wins.
    async fn put(&self, plan: &MealPlan) -> Result<()>;

    /// The plan covering `today`, else the plan with the latest start date.
    async fn current(&self, household_id: Uuid, today: NaiveDate) -> Result<Option<MealPlan>>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn HouseholdStore, _: &dyn PlanStore) {}
};
