//! `hoh prefs` subcommands: show and update household preferences.
//!
//! `set` is a partial update: options that are not given keep their stored
//! value, and the merged document replaces the stored one in a single upsert.

use anyhow::{Context, Result};
use sqlx::PgPool;

use hoh_db::models::{CookingTime, HouseholdPreferences, MealSuggestionMode, MealType};
use hoh_db::queries::preferences;

use crate::PrefsCommands;
use crate::resolve::{clean_list, parse_id};

/// Requested changes to a household's preferences.
#[derive(Debug, Default)]
pub struct PrefsUpdate {
    pub mode: Option<String>,
    pub cooking_time: Option<String>,
    pub meal_types: Option<Vec<String>>,
    pub breakfast: Option<Vec<String>>,
    pub lunch: Option<Vec<String>>,
    pub dinner: Option<Vec<String>>,
    pub snacks: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl PrefsUpdate {
    /// Apply the update on top of `current`.
    pub fn apply(self, mut current: HouseholdPreferences) -> Result<HouseholdPreferences> {
        if let Some(mode) = self.mode {
            current.mode = mode.trim().parse::<MealSuggestionMode>()?;
        }
        if let Some(cooking_time) = self.cooking_time {
            current.cooking_time = cooking_time.trim().parse::<CookingTime>()?;
        }
        if let Some(types) = self.meal_types {
            let mut parsed = Vec::new();
            for raw in clean_list(types) {
                let meal_type: MealType = raw.parse()?;
                if !parsed.contains(&meal_type) {
                    parsed.push(meal_type);
                }
            }
            if parsed.is_empty() {
                anyhow::bail!("at least one meal type must be enabled");
            }
            parsed.sort();
            current.meal_types = parsed;
        }
        for (meal_type, list) in [
            (MealType::Breakfast, self.breakfast),
            (MealType::Lunch, self.lunch),
            (MealType::Dinner, self.dinner),
            (MealType::Snack, self.snacks),
        ] {
            if let Some(list) = list {
                *current.recurring.for_meal_mut(meal_type) = clean_list(list);
            }
        }
        if let Some(notes) = self.notes {
            current.notes = notes;
        }
        Ok(current)
    }
}

pub async fn run_prefs_command(command: PrefsCommands, pool: &PgPool) -> Result<()> {
    match command {
        PrefsCommands::Show { household_id } => {
            let household_id = parse_id("household", &household_id)?;
            let prefs = preferences::get_preferences(pool, household_id).await?;
            match prefs {
                Some(prefs) => print_prefs(&prefs),
                None => {
                    println!("No preferences saved; defaults apply.");
                    print_prefs(&HouseholdPreferences::default());
                }
            }
            Ok(())
        }
        PrefsCommands::Set {
            household_id,
            mode,
            cooking_time,
            meal_types,
            breakfast,
            lunch,
            dinner,
            snacks,
            notes,
        } => {
            let household_id = parse_id("household", &household_id)?;
            let current = preferences::get_preferences(pool, household_id)
                .await?
                .unwrap_or_default();
            let update = PrefsUpdate {
                mode,
                cooking_time,
                meal_types,
                breakfast,
                lunch,
                dinner,
                snacks,
                notes,
            };
            let updated = update
                .apply(current)
                .context("invalid preference update")?;
            preferences::upsert_preferences(pool, household_id, &updated).await?;

            println!("Preferences saved.");
            print_prefs(&updated);
            Ok(())
        }
    }
}

fn print_prefs(prefs: &HouseholdPreferences) {
    let types: Vec<String> = prefs
        .enabled_meal_types()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("  Mode:         {}", prefs.mode);
    println!("  Cooking time: {}", prefs.cooking_time);
    println!("  Meal types:   {}", types.join(", "));
    for meal_type in MealType::ALL {
        let list = prefs.recurring.for_meal(meal_type);
        if !list.is_empty() {
            println!("  {:<13} {}", format!("{meal_type}:"), list.join(", "));
        }
    }
    if !prefs.notes.is_empty() {
        println!("  Notes:        {}", prefs.notes);
    }
}
