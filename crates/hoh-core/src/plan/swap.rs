//! Single-slot edits.
//!
//! Edits are copy-on-write: the engine returns a new plan document with
//! exactly one slot replaced and leaves the input untouched. The swap path
//! re-reads the household's *current* preferences rather than the mode
//! recorded on the plan.

use chrono::{DateTime, Utc};
use hoh_db::models::{FamilyMember, HouseholdPreferences, MealPlan, MealSlot, MealSuggestionMode};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use super::builder::bounded;
use super::request::{SlotAction, SlotAddress, SlotEdit};
use super::select::{pick_recurring, recurring_for};
use super::slot::{custom_slot, external_slot, recurring_slot, stamped};
use crate::config::EngineConfig;
use crate::diet::{self, DietaryNeeds};
use crate::error::MealPlanError;
use crate::recipes::RecipeSource;

/// Household state a swap is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct SwapContext<'a> {
    pub preferences: &'a HouseholdPreferences,
    pub members: &'a [FamilyMember],
    /// Joins the shared cohort when a shared slot is swapped.
    pub requester: Option<&'a DietaryNeeds>,
    pub updated_by: Option<&'a str>,
}

pub struct SlotSwapEngine<'a> {
    source: &'a dyn RecipeSource,
    config: &'a EngineConfig,
}

impl<'a> SlotSwapEngine<'a> {
    pub fn new(source: &'a dyn RecipeSource, config: &'a EngineConfig) -> Self {
        Self { source, config }
    }

    /// Apply `edit` to `plan`, returning the rewritten document.
    pub async fn apply<R: Rng + ?Sized>(
        &self,
        plan: &MealPlan,
        edit: &SlotEdit,
        ctx: SwapContext<'_>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<MealPlan, MealPlanError> {
        let address = edit.address;
        let index = plan
            .slot_index(address.date, address.meal_type, address.member_id)
            .ok_or_else(|| MealPlanError::not_found(describe_missing(&address)))?;
        let current = &plan.slots[index];

        let replacement = match &edit.action {
            SlotAction::SetCustom { name } => custom_slot(current, name),
            SlotAction::Swap => self.swap(current, &address, ctx, rng).await?,
        };
        let replacement = stamped(replacement, ctx.updated_by, now);

        let slots = plan
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                if i == index {
                    replacement.clone()
                } else {
                    slot.clone()
                }
            })
            .collect();

        Ok(MealPlan {
            slots,
            updated_at: now,
            ..plan.clone()
        })
    }

    async fn swap<R: Rng + ?Sized>(
        &self,
        current: &MealSlot,
        address: &SlotAddress,
        ctx: SwapContext<'_>,
        rng: &mut R,
    ) -> Result<MealSlot, MealPlanError> {
        let member = match address.member_id {
            Some(id) => Some(
                ctx.members
                    .iter()
                    .find(|m| m.id == id)
                    .ok_or_else(|| MealPlanError::not_found(format!("member {id} not found")))?,
            ),
            None => None,
        };
        let prefs = ctx.preferences;
        let meal_type = address.meal_type;

        if prefs.mode == MealSuggestionMode::UserOnly || meal_type.is_snack() {
            let list = recurring_for(prefs, member, meal_type);
            let name = pick_recurring(list, Some(current.title.trim()), rng).ok_or_else(|| {
                MealPlanError::not_found(format!(
                    "no alternative {meal_type} in the recurring list"
                ))
            })?;
            return Ok(recurring_slot(address.date, meal_type, member, name));
        }

        let needs = match member {
            Some(m) => DietaryNeeds::of_member(m),
            None => diet::aggregate(ctx.members, ctx.requester).shared,
        };
        let params = needs.to_params(prefs.cooking_time);
        let offset = rng.random_range(0..self.config.swap_offset_span.max(1));

        let candidates = bounded(
            self.config,
            self.source
                .search_batch(&params, meal_type, self.config.swap_batch_size, offset),
        )
        .await?;
        let found = candidates.len();
        let remaining: Vec<_> = candidates
            .iter()
            .filter(|c| c.id.to_string() != current.recipe_id)
            .collect();
        debug!(%meal_type, offset, found, remaining = remaining.len(), "swap candidates");

        let recipe = remaining
            .choose(rng)
            .ok_or_else(|| MealPlanError::not_found(format!("no alternative {meal_type} found")))?;
        Ok(external_slot(address.date, meal_type, member, recipe))
    }
}

fn describe_missing(address: &SlotAddress) -> String {
    match address.member_id {
        Some(member) => format!(
            "no {} slot on {} for member {member}",
            address.meal_type, address.date
        ),
        None => format!("no shared {} slot on {}", address.meal_type, address.date),
    }
}
