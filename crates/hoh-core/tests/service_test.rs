//! Integration tests for plan retrieval, requester resolution and store
//! failures.

mod common;

use chrono::{Days, Duration, Utc};
use hoh_core::MealPlanError;
use hoh_core::plan::GeneratePlanRequest;
use hoh_db::models::{HouseholdPreferences, MealPlan, MealSuggestionMode, RecurringMeals};
use hoh_test_utils::fakes::ScriptedRecipeSource;

use common::{Fixture, list, monday, rng};

fn fixture() -> Fixture {
    Fixture::new(
        HouseholdPreferences {
            mode: MealSuggestionMode::UserOnly,
            recurring: RecurringMeals {
                dinner: list(&["pasta"]),
                ..Default::default()
            },
            ..Default::default()
        },
        ScriptedRecipeSource::new(),
    )
}

async fn generate_week(fx: &Fixture, start: chrono::NaiveDate) -> MealPlan {
    fx.service
        .generate_with(&fx.requester, &GeneratePlanRequest::new(start), &mut rng(1))
        .await
        .unwrap()
}

#[tokio::test]
async fn current_plan_prefers_the_week_covering_today() {
    let fx = fixture();
    let this_week = generate_week(&fx, monday()).await;
    let next_week = generate_week(&fx, monday() + Days::new(7)).await;

    let wednesday = monday() + Days::new(2);
    let current = fx
        .service
        .current_plan(fx.household_id, wednesday)
        .await
        .unwrap();
    assert_eq!(current, Some(this_week));

    // Nothing covers a date far in the future: fall back to the latest plan.
    let later = monday() + Days::new(60);
    let current = fx.service.current_plan(fx.household_id, later).await.unwrap();
    assert_eq!(current, Some(next_week));
}

#[tokio::test]
async fn current_plan_is_none_without_plans() {
    let fx = fixture();
    let current = fx
        .service
        .current_plan(fx.household_id, monday())
        .await
        .unwrap();
    assert!(current.is_none());
}

#[tokio::test]
async fn expired_plans_are_invisible() {
    let fx = fixture();
    let mut plan = generate_week(&fx, monday()).await;
    plan.expires_at = Utc::now() - Duration::minutes(1);
    fx.plans.seed(plan);

    let err = fx
        .service
        .plan_for_week(fx.household_id, monday())
        .await
        .unwrap_err();
    assert!(matches!(err, MealPlanError::NotFound(_)));
    assert!(
        fx.service
            .current_plan(fx.household_id, monday())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn generated_plan_expires_after_retention_window() {
    let fx = fixture();
    let plan = generate_week(&fx, monday()).await;
    assert_eq!(plan.expires_at - plan.generated_at, Duration::days(90));
    assert_eq!(plan.generated_at, plan.updated_at);
}

#[tokio::test]
async fn plan_for_week_is_scoped_to_household() {
    let fx = fixture();
    generate_week(&fx, monday()).await;

    let other = fixture();
    let err = other
        .service
        .plan_for_week(other.household_id, monday())
        .await
        .unwrap_err();
    assert!(matches!(err, MealPlanError::NotFound(_)));
    assert!(
        fx.service
            .plan_for_week(fx.household_id, monday())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn resolve_requester_finds_linked_user() {
    let fx = fixture();
    let requester = fx.service.resolve_requester("user-1").await.unwrap();
    assert_eq!(requester.household_id, fx.household_id);

    let err = fx.service.resolve_requester("stranger").await.unwrap_err();
    assert!(matches!(err, MealPlanError::NotFound(_)));
}

#[tokio::test]
async fn store_failure_surfaces_as_store_error() {
    let fx = fixture();
    fx.plans.fail_puts();

    let err = fx
        .service
        .generate_with(&fx.requester, &GeneratePlanRequest::new(monday()), &mut rng(1))
        .await
        .unwrap_err();

    assert!(matches!(err, MealPlanError::Store(_)));
    assert!(err.to_string().contains("plan store unavailable"));
    assert!(fx.plans.stored(fx.household_id, monday()).is_none());
}

#[tokio::test]
async fn generate_uses_os_rng_by_default() {
    let fx = fixture();
    let plan = fx
        .service
        .generate(&fx.requester, &GeneratePlanRequest::new(monday()))
        .await
        .unwrap();
    assert_eq!(plan.slots.len(), 7);
}
