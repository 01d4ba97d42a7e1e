//! Meal plan generation and slot swap engine.
//!
//! The engine turns a household's preferences and members into a seven day
//! [`MealPlan`](hoh_db::models::MealPlan), sourcing each slot either from a
//! recurring meal list or from an external recipe suggestion service, and
//! replaces single slots on request without touching the rest of the plan.

pub mod config;
pub mod diet;
pub mod error;
pub mod plan;
pub mod recipes;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use error::MealPlanError;
pub use service::MealPlanService;
