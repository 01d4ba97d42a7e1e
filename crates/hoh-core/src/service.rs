//! Request-level orchestration.
//!
//! [`MealPlanService`] ties the stores and recipe source to the plan builder
//! and swap engine. Each call is stateless: it loads what it needs, runs the
//! engine, and writes the finished document back in one `put`.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use hoh_db::models::MealPlan;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::MealPlanError;
use crate::plan::{
    GenerateInput, GeneratePlanRequest, PlanBuilder, SlotEditRequest, SlotSwapEngine, SwapContext,
};
use crate::recipes::RecipeSource;
use crate::store::{HouseholdStore, PlanStore, Requester};

#[derive(Clone)]
pub struct MealPlanService {
    households: Arc<dyn HouseholdStore>,
    plans: Arc<dyn PlanStore>,
    recipes: Arc<dyn RecipeSource>,
    config: EngineConfig,
}

impl MealPlanService {
    pub fn new(
        households: Arc<dyn HouseholdStore>,
        plans: Arc<dyn PlanStore>,
        recipes: Arc<dyn RecipeSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            households,
            plans,
            recipes,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve a user id to the caller's household and constraints.
    pub async fn resolve_requester(&self, user_id: &str) -> Result<Requester, MealPlanError> {
        self.households
            .requester(user_id)
            .await
            .map_err(MealPlanError::Store)?
            .ok_or_else(|| MealPlanError::not_found(format!("user {user_id:?} has no household")))
    }

    /// Generate and store the plan for the requested week, overwriting any
    /// existing plan for that week.
    pub async fn generate(
        &self,
        requester: &Requester,
        request: &GeneratePlanRequest,
    ) -> Result<MealPlan, MealPlanError> {
        self.generate_with(requester, request, &mut StdRng::from_os_rng())
            .await
    }

    pub async fn generate_with<R: Rng + ?Sized>(
        &self,
        requester: &Requester,
        request: &GeneratePlanRequest,
        rng: &mut R,
    ) -> Result<MealPlan, MealPlanError> {
        let start_date = request.validate()?;
        let household_id = requester.household_id;

        let (preferences, members) = tokio::try_join!(
            self.households.preferences(household_id),
            self.households.members(household_id),
        )
        .map_err(MealPlanError::Store)?;

        let input = GenerateInput {
            household_id,
            start_date,
            preferences: &preferences,
            members: &members,
            requester: Some(&requester.needs),
            generated_by: Some(&requester.user_id),
        };
        let plan = PlanBuilder::new(self.recipes.as_ref(), &self.config)
            .generate(input, rng)
            .await?;

        self.plans.put(&plan).await.map_err(MealPlanError::Store)?;
        info!(
            household_id = %household_id,
            start_date = %start_date,
            slots = plan.slots.len(),
            "saved meal plan"
        );
        Ok(plan)
    }

    /// Swap or override one slot of the plan starting on `start_date`.
    pub async fn apply_slot_edit(
        &self,
        requester: &Requester,
        start_date: NaiveDate,
        request: &SlotEditRequest,
    ) -> Result<MealPlan, MealPlanError> {
        self.apply_slot_edit_with(requester, start_date, request, &mut StdRng::from_os_rng())
            .await
    }

    pub async fn apply_slot_edit_with<R: Rng + ?Sized>(
        &self,
        requester: &Requester,
        start_date: NaiveDate,
        request: &SlotEditRequest,
        rng: &mut R,
    ) -> Result<MealPlan, MealPlanError> {
        let edit = request.validate()?;
        let household_id = requester.household_id;

        let plan = self.plan_for_week(household_id, start_date).await?;
        let (preferences, members) = tokio::try_join!(
            self.households.preferences(household_id),
            self.households.members(household_id),
        )
        .map_err(MealPlanError::Store)?;

        let ctx = SwapContext {
            preferences: &preferences,
            members: &members,
            requester: Some(&requester.needs),
            updated_by: Some(&requester.user_id),
        };
        let updated = SlotSwapEngine::new(self.recipes.as_ref(), &self.config)
            .apply(&plan, &edit, ctx, rng, Utc::now())
            .await?;

        self.plans.put(&updated).await.map_err(MealPlanError::Store)?;
        info!(
            household_id = %household_id,
            start_date = %start_date,
            date = %edit.address.date,
            meal_type = %edit.address.meal_type,
            "updated meal slot"
        );
        Ok(updated)
    }

    /// The plan covering `today`, else the most recent one.
    pub async fn current_plan(
        &self,
        household_id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<MealPlan>, MealPlanError> {
        self.plans
            .current(household_id, today)
            .await
            .map_err(MealPlanError::Store)
    }

    /// The plan starting on `start_date`.
    pub async fn plan_for_week(
        &self,
        household_id: Uuid,
        start_date: NaiveDate,
    ) -> Result<MealPlan, MealPlanError> {
        self.plans
            .get(household_id, start_date)
            .await
            .map_err(MealPlanError::Store)?
            .ok_or_else(|| MealPlanError::not_found(format!("no meal plan for week {start_date}")))
    }
}
