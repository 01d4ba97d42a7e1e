//! Full-week plan generation.
//!
//! Generation runs in three phases:
//!
//! 1. **Preconditions**: the week must be representable and, in user-only
//!    mode, at least one recurring list must have entries. Nothing external
//!    is called before these pass.
//! 2. **Suggestions**: in AI and hybrid modes, one week batch for the shared
//!    cohort and, when separate members exist, one more for the union of
//!    their constraints. Both are fetched concurrently; either failing
//!    aborts generation.
//! 3. **Layout**: for each of the seven days, shared slots for every enabled
//!    meal type, then member-scoped non-snack slots for each separate member.
//!
//! The builder returns the finished document; persisting it is the caller's
//! job, so a failed generation never leaves a partial plan behind.

use std::future::Future;

use chrono::{DateTime, Days, NaiveDate, Utc};
use hoh_db::models::{
    FamilyMember, HouseholdPreferences, MealPlan, MealSlot, MealSuggestionMode, MealType,
};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::PLAN_DAYS;
use super::select::{SlotSource, choose_source, pick_recurring, recurring_for};
use super::slot::{external_slot, recurring_slot};
use crate::config::EngineConfig;
use crate::diet::{self, DietaryNeeds};
use crate::error::MealPlanError;
use crate::recipes::{DietParams, RecipeError, RecipeSource, WeekBatch};

/// Everything generation needs about one household.
#[derive(Debug, Clone, Copy)]
pub struct GenerateInput<'a> {
    pub household_id: Uuid,
    pub start_date: NaiveDate,
    pub preferences: &'a HouseholdPreferences,
    pub members: &'a [FamilyMember],
    /// The requesting user's own constraints; joins the shared cohort.
    pub requester: Option<&'a DietaryNeeds>,
    pub generated_by: Option<&'a str>,
}

/// Builds whole-week plans from household configuration.
pub struct PlanBuilder<'a> {
    source: &'a dyn RecipeSource,
    config: &'a EngineConfig,
}

/// Run a recipe call under the configured timeout.
pub(crate) async fn bounded<T>(
    config: &EngineConfig,
    call: impl Future<Output = Result<T, RecipeError>>,
) -> Result<T, RecipeError> {
    tokio::time::timeout(config.upstream_timeout, call)
        .await
        .map_err(|_| RecipeError::Timeout(config.upstream_timeout))?
}

fn has_entries(list: &[String]) -> bool {
    list.iter().any(|s| !s.trim().is_empty())
}

impl<'a> PlanBuilder<'a> {
    pub fn new(source: &'a dyn RecipeSource, config: &'a EngineConfig) -> Self {
        Self { source, config }
    }

    /// Generate a complete plan for the week starting at `input.start_date`.
    pub async fn generate<R: Rng + ?Sized>(
        &self,
        input: GenerateInput<'_>,
        rng: &mut R,
    ) -> Result<MealPlan, MealPlanError> {
        let prefs = input.preferences;
        let end_date = input
            .start_date
            .checked_add_days(Days::new(PLAN_DAYS - 1))
            .ok_or_else(|| {
                MealPlanError::validation(format!("start date {} is out of range", input.start_date))
            })?;
        check_recurring_available(prefs, input.members)?;

        let cohorts = diet::aggregate(input.members, input.requester);
        let meal_types = prefs.enabled_meal_types();

        let (shared_batch, separate_batch) = if needs_suggestions(prefs.mode, &meal_types) {
            let shared_params = cohorts.shared.to_params(prefs.cooking_time);
            let separate_params = cohorts
                .separate_union()
                .map(|needs| needs.to_params(prefs.cooking_time));
            let (shared, separate) = self
                .fetch_batches(&shared_params, separate_params.as_ref())
                .await?;
            (Some(shared), separate)
        } else {
            (None, None)
        };

        let mut slots = Vec::new();
        for (day_index, date) in input.start_date.iter_days().take(PLAN_DAYS as usize).enumerate() {
            for &meal_type in &meal_types {
                if let Some(slot) = fill_slot(
                    prefs,
                    None,
                    date,
                    day_index,
                    meal_type,
                    shared_batch.as_ref(),
                    rng,
                ) {
                    slots.push(slot);
                }
            }

            for cohort in &cohorts.separate {
                for &meal_type in meal_types.iter().filter(|m| !m.is_snack()) {
                    if let Some(slot) = fill_slot(
                        prefs,
                        Some(cohort.member),
                        date,
                        day_index,
                        meal_type,
                        separate_batch.as_ref(),
                        rng,
                    ) {
                        slots.push(slot);
                    }
                }
            }
        }

        let now = Utc::now();
        info!(
            household_id = %input.household_id,
            start_date = %input.start_date,
            mode = %prefs.mode,
            slots = slots.len(),
            separate_members = cohorts.separate.len(),
            "built meal plan"
        );

        Ok(new_plan(input, end_date, slots, now, self.config))
    }

    async fn fetch_batches(
        &self,
        shared: &DietParams,
        separate: Option<&DietParams>,
    ) -> Result<(WeekBatch, Option<WeekBatch>), MealPlanError> {
        debug!(
            source = self.source.name(),
            second_batch = separate.is_some(),
            "requesting week suggestions"
        );

        let shared_call = bounded(self.config, self.source.generate_week(shared));
        let separate_call = async {
            match separate {
                Some(params) => bounded(self.config, self.source.generate_week(params))
                    .await
                    .map(Some),
                None => Ok(None),
            }
        };

        Ok(tokio::try_join!(shared_call, separate_call)?)
    }
}

/// User-only mode needs at least one recurring entry somewhere.
fn check_recurring_available(
    prefs: &HouseholdPreferences,
    members: &[FamilyMember],
) -> Result<(), MealPlanError> {
    if prefs.mode != MealSuggestionMode::UserOnly {
        return Ok(());
    }
    let any_list = |meals: &hoh_db::models::RecurringMeals| {
        MealType::ALL
            .iter()
            .any(|m| has_entries(meals.for_meal(*m)))
    };
    if any_list(&prefs.recurring) || members.iter().any(|m| any_list(&m.recurring)) {
        return Ok(());
    }
    Err(MealPlanError::State(
        "no recurring meals are configured; add recurring meals to your preferences \
         or switch to a mode that includes suggestions"
            .to_string(),
    ))
}

fn needs_suggestions(mode: MealSuggestionMode, meal_types: &[MealType]) -> bool {
    mode != MealSuggestionMode::UserOnly && meal_types.iter().any(|m| !m.is_snack())
}

fn fill_slot<R: Rng + ?Sized>(
    prefs: &HouseholdPreferences,
    member: Option<&FamilyMember>,
    date: NaiveDate,
    day_index: usize,
    meal_type: MealType,
    batch: Option<&WeekBatch>,
    rng: &mut R,
) -> Option<MealSlot> {
    let list = recurring_for(prefs, member, meal_type);
    match choose_source(prefs.mode, meal_type, day_index, has_entries(list)) {
        SlotSource::Recurring => pick_recurring(list, None, rng)
            .map(|name| recurring_slot(date, meal_type, member, name)),
        SlotSource::External => batch?
            .meal_for(date, meal_type)
            .map(|recipe| external_slot(date, meal_type, member, recipe)),
        SlotSource::Skip => None,
    }
}

fn new_plan(
    input: GenerateInput<'_>,
    end_date: NaiveDate,
    slots: Vec<MealSlot>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> MealPlan {
    MealPlan {
        household_id: input.household_id,
        start_date: input.start_date,
        end_date,
        slots,
        mode: input.preferences.mode,
        generated_by: input.generated_by.map(str::to_owned),
        generated_at: now,
        updated_at: now,
        expires_at: now + config.retention(),
    }
}
