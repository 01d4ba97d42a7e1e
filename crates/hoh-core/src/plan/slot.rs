//! Slot constructors.
//!
//! User-preference slots never carry recipe metadata; external slots
//! always carry all of it.

use chrono::{DateTime, NaiveDate, Utc};
use hoh_db::models::{FamilyMember, MealSlot, MealType, Provenance};

use crate::recipes::RecipeCandidate;

/// Lowercase, alphanumeric runs joined by `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for word in name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
    }
    slug
}

fn blank(date: NaiveDate, meal_type: MealType, member: Option<&FamilyMember>) -> MealSlot {
    MealSlot {
        date,
        meal_type,
        member_id: member.map(|m| m.id),
        member_name: member.map(|m| m.name.clone()),
        recipe_id: String::new(),
        title: String::new(),
        image: None,
        ready_in_minutes: None,
        servings: None,
        source_url: None,
        provenance: Provenance::UserPreference,
        custom: false,
        updated_by: None,
        updated_at: None,
    }
}

/// A slot filled from a recurring meal list.
pub fn recurring_slot(
    date: NaiveDate,
    meal_type: MealType,
    member: Option<&FamilyMember>,
    name: &str,
) -> MealSlot {
    MealSlot {
        recipe_id: format!("user-{}", slugify(name)),
        title: name.to_string(),
        ..blank(date, meal_type, member)
    }
}

/// A slot filled from an external suggestion.
pub fn external_slot(
    date: NaiveDate,
    meal_type: MealType,
    member: Option<&FamilyMember>,
    recipe: &RecipeCandidate,
) -> MealSlot {
    MealSlot {
        recipe_id: recipe.id.to_string(),
        title: recipe.title.clone(),
        image: Some(recipe.image.clone()),
        ready_in_minutes: Some(recipe.ready_in_minutes),
        servings: Some(recipe.servings),
        source_url: Some(recipe.source_url.clone()),
        provenance: Provenance::ExternalSuggestion,
        ..blank(date, meal_type, member)
    }
}

/// Overwrite `slot` with a literal name. Metadata is cleared.
pub fn custom_slot(slot: &MealSlot, name: &str) -> MealSlot {
    MealSlot {
        date: slot.date,
        meal_type: slot.meal_type,
        member_id: slot.member_id,
        member_name: slot.member_name.clone(),
        recipe_id: format!("custom-{}", slugify(name)),
        title: name.to_string(),
        image: None,
        ready_in_minutes: None,
        servings: None,
        source_url: None,
        provenance: Provenance::UserPreference,
        custom: true,
        updated_by: None,
        updated_at: None,
    }
}

/// Stamp the audit fields of an edited slot.
pub fn stamped(mut slot: MealSlot, updated_by: Option<&str>, now: DateTime<Utc>) -> MealSlot {
    slot.updated_by = updated_by.map(str::to_owned);
    slot.updated_at = Some(now);
    slot
}
