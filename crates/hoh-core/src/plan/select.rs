//! Per-slot source policy.

use hoh_db::models::{FamilyMember, HouseholdPreferences, MealSuggestionMode, MealType};
use rand::Rng;
use rand::seq::IndexedRandom;

/// Where a slot's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    /// Pick from the recurring list.
    Recurring,
    /// Take the external batch entry at the meal's fixed position.
    External,
    /// Emit no slot.
    Skip,
}

/// Decide the source for one slot.
///
/// `day_index` is the offset from the plan's start date (0..=6).
/// `recurring_available` is whether the relevant recurring list is
/// non-empty. Snacks are never external.
pub fn choose_source(
    mode: MealSuggestionMode,
    meal_type: MealType,
    day_index: usize,
    recurring_available: bool,
) -> SlotSource {
    let recurring_or_skip = if recurring_available {
        SlotSource::Recurring
    } else {
        SlotSource::Skip
    };

    if meal_type.is_snack() {
        return recurring_or_skip;
    }

    match mode {
        MealSuggestionMode::UserOnly => recurring_or_skip,
        MealSuggestionMode::AiOnly => SlotSource::External,
        MealSuggestionMode::Hybrid => {
            if day_index % 2 == 0 && recurring_available {
                SlotSource::Recurring
            } else {
                SlotSource::External
            }
        }
    }
}

/// The recurring list for a slot.
///
/// A member's own list wins when non-empty; otherwise the household list
/// applies.
pub fn recurring_for<'a>(
    prefs: &'a HouseholdPreferences,
    member: Option<&'a FamilyMember>,
    meal_type: MealType,
) -> &'a [String] {
    member
        .map(|m| m.recurring.for_meal(meal_type))
        .filter(|list| !list.is_empty())
        .unwrap_or_else(|| prefs.recurring.for_meal(meal_type))
}

/// Pick one non-blank entry uniformly at random, skipping `exclude`.
pub fn pick_recurring<'a, R: Rng + ?Sized>(
    list: &'a [String],
    exclude: Option<&str>,
    rng: &mut R,
) -> Option<&'a str> {
    let options: Vec<&str> = list
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && Some(*s) != exclude)
        .collect();
    options.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use hoh_db::models::RecurringMeals;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use uuid::Uuid;

    use super::*;
    use MealSuggestionMode::*;

    #[test]
    fn user_only_never_goes_external() {
        for meal in MealType::ALL {
            for day in 0..7 {
                assert_ne!(choose_source(UserOnly, meal, day, true), SlotSource::External);
                assert_eq!(choose_source(UserOnly, meal, day, false), SlotSource::Skip);
            }
        }
    }

    #[test]
    fn snacks_are_never_external() {
        for mode in [UserOnly, AiOnly, Hybrid] {
            assert_eq!(
                choose_source(mode, MealType::Snack, 1, true),
                SlotSource::Recurring
            );
            assert_eq!(choose_source(mode, MealType::Snack, 1, false), SlotSource::Skip);
        }
    }

    #[test]
    fn ai_only_ignores_recurring_for_meals() {
        assert_eq!(
            choose_source(AiOnly, MealType::Breakfast, 0, true),
            SlotSource::External
        );
    }

    #[test]
    fn hybrid_alternates_by_day_parity() {
        let sources: Vec<_> = (0..7)
            .map(|day| choose_source(Hybrid, MealType::Dinner, day, true))
            .collect();
        for (day, source) in sources.iter().enumerate() {
            let expected = if day % 2 == 0 {
                SlotSource::Recurring
            } else {
                SlotSource::External
            };
            assert_eq!(*source, expected, "day {day}");
        }
        assert_eq!(
            choose_source(Hybrid, MealType::Dinner, 0, false),
            SlotSource::External
        );
    }

    #[test]
    fn member_list_falls_back_to_household() {
        let prefs = HouseholdPreferences {
            recurring: RecurringMeals {
                dinner: vec!["pasta".into()],
                lunch: vec!["soup".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        let member = FamilyMember {
            id: Uuid::new_v4(),
            household_id: Uuid::nil(),
            name: "Jake".into(),
            age: Some(7),
            dietary_restrictions: vec![],
            allergies: vec![],
            shares_adult_meals: false,
            recurring: RecurringMeals {
                dinner: vec!["nuggets".into()],
                ..Default::default()
            },
        };

        assert_eq!(recurring_for(&prefs, Some(&member), MealType::Dinner), ["nuggets"]);
        assert_eq!(recurring_for(&prefs, Some(&member), MealType::Lunch), ["soup"]);
        assert_eq!(recurring_for(&prefs, None, MealType::Dinner), ["pasta"]);
        assert!(recurring_for(&prefs, None, MealType::Breakfast).is_empty());
    }

    #[test]
    fn pick_skips_excluded_and_blank_entries() {
        let mut rng = StdRng::seed_from_u64(7);
        let list = vec!["eggs".to_string(), " ".to_string(), "oatmeal".to_string()];
        for _ in 0..20 {
            assert_eq!(pick_recurring(&list, Some("eggs"), &mut rng), Some("oatmeal"));
        }
        let single = vec!["eggs".to_string()];
        assert_eq!(pick_recurring(&single, Some("eggs"), &mut rng), None);
        assert_eq!(pick_recurring(&[], None, &mut rng), None);
    }
}
