//! Shared fixture for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use hoh_core::store::Requester;
use hoh_core::{EngineConfig, MealPlanService};
use hoh_db::models::HouseholdPreferences;
use hoh_test_utils::fakes::{
    InMemoryHouseholdStore, InMemoryPlanStore, ScriptedRecipeSource, requester,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

pub struct Fixture {
    pub household_id: Uuid,
    pub requester: Requester,
    pub households: Arc<InMemoryHouseholdStore>,
    pub plans: Arc<InMemoryPlanStore>,
    pub recipes: Arc<ScriptedRecipeSource>,
    pub service: MealPlanService,
}

impl Fixture {
    pub fn new(prefs: HouseholdPreferences, recipes: ScriptedRecipeSource) -> Self {
        Self::with_config(prefs, recipes, EngineConfig::default())
    }

    pub fn with_config(
        prefs: HouseholdPreferences,
        recipes: ScriptedRecipeSource,
        config: EngineConfig,
    ) -> Self {
        let household_id = Uuid::new_v4();
        let households = Arc::new(InMemoryHouseholdStore::new());
        households.set_preferences(household_id, prefs);
        let requester = requester(household_id);
        households.add_requester(requester.clone());

        let plans = Arc::new(InMemoryPlanStore::new());
        let recipes = Arc::new(recipes);
        let service = MealPlanService::new(
            households.clone(),
            plans.clone(),
            recipes.clone(),
            config,
        );

        Self {
            household_id,
            requester,
            households,
            plans,
            recipes,
            service,
        }
    }
}

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
