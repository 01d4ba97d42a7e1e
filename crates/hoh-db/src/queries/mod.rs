pub mod households;
pub mod meal_plans;
pub mod members;
pub mod preferences;
