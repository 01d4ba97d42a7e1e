//! Caller-visible failure taxonomy for plan generation and slot edits.

use crate::plan::RequestError;
use crate::recipes::RecipeError;

/// Every failure a generate or slot edit request can surface.
///
/// Each variant maps to a distinct status class at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum MealPlanError {
    /// Malformed or missing input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The household's configuration does not allow the operation.
    #[error("{0}")]
    State(String),

    /// Plan, slot, member or alternative is absent.
    #[error("{0}")]
    NotFound(String),

    /// The recipe service reported an exhausted quota.
    #[error("recipe service quota exhausted: {0}")]
    RateLimited(String),

    /// Persistence failure.
    #[error("store error: {0:#}")]
    Store(#[source] anyhow::Error),

    /// Recipe service failure other than quota exhaustion.
    #[error("recipe service error: {0}")]
    Upstream(String),
}

impl MealPlanError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<RequestError> for MealPlanError {
    fn from(err: RequestError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RecipeError> for MealPlanError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::QuotaExceeded(detail) => Self::RateLimited(detail),
            other => Self::Upstream(other.to_string()),
        }
    }
}
