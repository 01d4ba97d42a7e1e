use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Household policy selecting the mix of recurring meals and external
/// suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum MealSuggestionMode {
    /// Only the household's recurring meal lists.
    #[sqlx(rename = "user_preference")]
    #[serde(rename = "user_preference")]
    UserOnly,
    /// External suggestions for every non-snack slot.
    #[sqlx(rename = "ai_suggest")]
    #[serde(rename = "ai_suggest")]
    AiOnly,
    /// Recurring meals on even days, suggestions on odd days.
    #[default]
    #[sqlx(rename = "ai_and_user")]
    #[serde(rename = "ai_and_user")]
    Hybrid,
}

impl fmt::Display for MealSuggestionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UserOnly => "user_preference",
            Self::AiOnly => "ai_suggest",
            Self::Hybrid => "ai_and_user",
        };
        f.write_str(s)
    }
}

impl FromStr for MealSuggestionMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_preference" | "user_only" => Ok(Self::UserOnly),
            "ai_suggest" | "ai_only" => Ok(Self::AiOnly),
            "ai_and_user" | "hybrid" => Ok(Self::Hybrid),
            other => Err(ParseEnumError::new("meal suggestion mode", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// A meal within a day.
///
/// Ordering follows the canonical order used when laying out a day:
/// breakfast, lunch, dinner, snack.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Every meal type in canonical order.
    pub const ALL: [MealType; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    /// Position of this meal within a day of an external week batch.
    ///
    /// Snacks have no position: the suggestion service never produces them.
    pub fn batch_position(self) -> Option<usize> {
        match self {
            Self::Breakfast => Some(0),
            Self::Lunch => Some(1),
            Self::Dinner => Some(2),
            Self::Snack => None,
        }
    }

    pub fn is_snack(self) -> bool {
        self == Self::Snack
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        };
        f.write_str(s)
    }
}

impl FromStr for MealType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" | "snacks" => Ok(Self::Snack),
            other => Err(ParseEnumError::new("meal type", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// How much time the household is willing to spend cooking a meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CookingTime {
    /// Under 20 minutes.
    Quick,
    /// 20 to 45 minutes.
    #[default]
    Medium,
    /// No upper bound.
    Elaborate,
}

impl CookingTime {
    /// Upper bound on a recipe's ready time, in minutes.
    pub fn max_ready_minutes(self) -> Option<u32> {
        match self {
            Self::Quick => Some(20),
            Self::Medium => Some(45),
            Self::Elaborate => None,
        }
    }
}

impl fmt::Display for CookingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quick => "quick",
            Self::Medium => "medium",
            Self::Elaborate => "elaborate",
        };
        f.write_str(s)
    }
}

impl FromStr for CookingTime {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quick" => Ok(Self::Quick),
            "medium" => Ok(Self::Medium),
            "elaborate" => Ok(Self::Elaborate),
            other => Err(ParseEnumError::new("cooking time", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Where a slot's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Picked from a recurring list or typed in by a household member.
    UserPreference,
    /// Returned by the recipe suggestion service.
    ExternalSuggestion,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UserPreference => "user_preference",
            Self::ExternalSuggestion => "external_suggestion",
        };
        f.write_str(s)
    }
}

/// Error returned when parsing an invalid enum string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// Recurring meal names per meal type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RecurringMeals {
    #[sqlx(rename = "breakfast_meals")]
    pub breakfast: Vec<String>,
    #[sqlx(rename = "lunch_meals")]
    pub lunch: Vec<String>,
    #[sqlx(rename = "dinner_meals")]
    pub dinner: Vec<String>,
    #[sqlx(rename = "snack_meals")]
    pub snacks: Vec<String>,
}

impl RecurringMeals {
    /// The recurring list for one meal type.
    pub fn for_meal(&self, meal_type: MealType) -> &[String] {
        match meal_type {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
            MealType::Snack => &self.snacks,
        }
    }

    /// Mutable access to the recurring list for one meal type.
    pub fn for_meal_mut(&mut self, meal_type: MealType) -> &mut Vec<String> {
        match meal_type {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snacks,
        }
    }

    /// `true` when every list is empty.
    pub fn is_empty(&self) -> bool {
        MealType::ALL.iter().all(|m| self.for_meal(*m).is_empty())
    }
}

/// A household -- the owner of preferences, members and plans.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated user linked to a household.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: String,
    pub household_id: Uuid,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Household-wide meal generation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HouseholdPreferences {
    pub mode: MealSuggestionMode,
    pub cooking_time: CookingTime,
    /// Meal types that receive slots, in any order.
    pub meal_types: Vec<MealType>,
    #[sqlx(flatten)]
    pub recurring: RecurringMeals,
    pub notes: String,
}

impl Default for HouseholdPreferences {
    fn default() -> Self {
        Self {
            mode: MealSuggestionMode::default(),
            cooking_time: CookingTime::default(),
            meal_types: MealType::ALL.to_vec(),
            recurring: RecurringMeals::default(),
            notes: String::new(),
        }
    }
}

impl HouseholdPreferences {
    /// Enabled meal types, de-duplicated, in canonical order.
    pub fn enabled_meal_types(&self) -> Vec<MealType> {
        MealType::ALL
            .into_iter()
            .filter(|m| self.meal_types.contains(m))
            .collect()
    }
}

/// A member of a household with their own dietary constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FamilyMember {
    pub id: Uuid,
    pub household_id: Uuid,
    pub name: String,
    pub age: Option<i32>,
    pub dietary_restrictions: Vec<String>,
    pub allergies: Vec<String>,
    /// `false` puts the member in a separate cohort with their own slots.
    pub shares_adult_meals: bool,
    /// Only consulted when `shares_adult_meals` is `false`.
    #[sqlx(flatten)]
    pub recurring: RecurringMeals,
}

// ---------------------------------------------------------------------------
// Plan documents
// ---------------------------------------------------------------------------

/// One (date, meal type[, member]) assignment within a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSlot {
    pub date: NaiveDate,
    pub meal_type: MealType,
    /// Absent for shared (adult cohort) slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_name: Option<String>,
    pub recipe_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub provenance: Provenance,
    #[serde(default)]
    pub custom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MealSlot {
    /// Whether this slot sits at the given address.
    ///
    /// `member_id` must match exactly: `None` only addresses shared slots.
    pub fn is_at(&self, date: NaiveDate, meal_type: MealType, member_id: Option<Uuid>) -> bool {
        self.date == date && self.meal_type == meal_type && self.member_id == member_id
    }
}

/// A household's plan for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub household_id: Uuid,
    pub start_date: NaiveDate,
    /// Always `start_date + 6 days`.
    pub end_date: NaiveDate,
    #[sqlx(json)]
    pub slots: Vec<MealSlot>,
    /// Mode in force when the plan was generated.
    pub mode: MealSuggestionMode,
    pub generated_by: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MealPlan {
    /// Whether `date` lies within `[start_date, end_date]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Find the index of the slot at the given address.
    pub fn slot_index(
        &self,
        date: NaiveDate,
        meal_type: MealType,
        member_id: Option<Uuid>,
    ) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.is_at(date, meal_type, member_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
