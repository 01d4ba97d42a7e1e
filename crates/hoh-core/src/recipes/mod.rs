//! The `RecipeSource` trait -- the contract for external recipe suggestions.
//!
//! A source produces either a week-long batch (up to three meals per
//! weekday) for full plan generation, or a small batch of candidates for a
//! single meal type when swapping one slot. The trait is object-safe so the
//! service can hold it as `Arc<dyn RecipeSource>`.

pub mod spoonacular;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use hoh_db::models::MealType;
use serde::{Deserialize, Serialize};

pub use spoonacular::SpoonacularClient;

/// Diet parameters for one cohort, in the source's vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietParams {
    /// Single diet token, e.g. `"vegetarian"`.
    pub diet: Option<String>,
    /// Comma-separated ingredients to exclude.
    pub exclude: Option<String>,
    /// Upper bound on ready time, in minutes.
    pub max_ready_minutes: Option<u32>,
}

/// A recipe returned by the source. Every field is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCandidate {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub ready_in_minutes: u32,
    pub servings: u32,
    pub source_url: String,
}

/// A week of suggestions, indexed by weekday (Monday first).
///
/// Within a day, meals sit at fixed positions: breakfast 0, lunch 1,
/// dinner 2. A day may carry fewer than three meals, and a position may be
/// vacant when its recipe was withheld.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekBatch {
    days: [Vec<Option<RecipeCandidate>>; 7],
}

impl WeekBatch {
    /// Replace the meals for one weekday (`0` = Monday).
    pub fn set_day<I, M>(&mut self, weekday_index: usize, meals: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<Option<RecipeCandidate>>,
    {
        if let Some(day) = self.days.get_mut(weekday_index) {
            *day = meals.into_iter().map(Into::into).collect();
        }
    }

    /// Vacate every position whose recipe takes longer than `max_minutes`.
    /// Later positions keep their meal type.
    pub fn cap_ready_time(&mut self, max_minutes: u32) {
        for position in self.days.iter_mut().flatten() {
            if position
                .as_ref()
                .is_some_and(|recipe| recipe.ready_in_minutes > max_minutes)
            {
                *position = None;
            }
        }
    }

    /// The suggestion for `meal_type` on the weekday of `date`.
    ///
    /// Always `None` for snacks.
    pub fn meal_for(&self, date: NaiveDate, meal_type: MealType) -> Option<&RecipeCandidate> {
        let position = meal_type.batch_position()?;
        let weekday = date.weekday().num_days_from_monday() as usize;
        self.days[weekday].get(position)?.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().flatten().all(Option::is_none)
    }
}

/// Failures reported by a recipe source.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// The account's request quota is spent (HTTP 402/429).
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Transport failure or non-success status.
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Adapter interface for an external recipe suggestion service.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    /// Human-readable name for logging (e.g. "spoonacular").
    fn name(&self) -> &str;

    /// Generate a week-long batch of suggestions for one cohort.
    async fn generate_week(&self, params: &DietParams) -> Result<WeekBatch, RecipeError>;

    /// Search for up to `count` candidates of one meal type, skipping the
    /// first `offset` results.
    async fn search_batch(
        &self,
        params: &DietParams,
        meal_type: MealType,
        count: u32,
        offset: u32,
    ) -> Result<Vec<RecipeCandidate>, RecipeError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn RecipeSource) {}
};
