//! Integration tests for households, user profiles, preferences and members.

use hoh_db::models::{
    CookingTime, HouseholdPreferences, MealSuggestionMode, MealType, RecurringMeals,
};
use hoh_db::pool;
use hoh_db::queries::members::{self, NewMember};
use hoh_db::queries::{households, preferences};
use hoh_test_utils::{create_test_db, drop_test_db};

#[tokio::test]
async fn migrations_create_every_table() {
    let (pool, db_name) = create_test_db().await;

    let summary = pool::schema_summary(&pool).await.unwrap();
    let names: Vec<&str> = summary.tables.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, pool::SCHEMA_TABLES.to_vec());
    assert!(summary.tables.iter().all(|(_, n)| *n == 0));
    assert_eq!(summary.expired_plans, 0);

    // Every listed table exists and nothing else was created besides sqlx's own.
    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' AND tablename NOT LIKE '\\_sqlx%' \
         ORDER BY tablename",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let mut expected: Vec<&str> = pool::SCHEMA_TABLES.to_vec();
    expected.sort_unstable();
    assert_eq!(tables, expected);

    // Re-running is a no-op.
    pool::run_migrations(&pool).await.unwrap();

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn user_profile_links_and_relinks() {
    let (pool, db_name) = create_test_db().await;
    let first = households::insert_household(&pool, "First").await.unwrap();
    let second = households::insert_household(&pool, "Second").await.unwrap();

    households::upsert_user_profile(&pool, "u1", first.id, &["vegan".into()], &[])
        .await
        .unwrap();
    let relinked =
        households::upsert_user_profile(&pool, "u1", second.id, &[], &["peanut".into()])
            .await
            .unwrap();
    assert_eq!(relinked.household_id, second.id);

    let fetched = households::get_user_profile(&pool, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.household_id, second.id);
    assert!(fetched.dietary_restrictions.is_empty());
    assert_eq!(fetched.allergies, vec!["peanut".to_string()]);
    assert!(
        households::get_user_profile(&pool, "nobody")
            .await
            .unwrap()
            .is_none()
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn preferences_round_trip_and_replace() {
    let (pool, db_name) = create_test_db().await;
    let house = households::insert_household(&pool, "Prefs").await.unwrap();

    assert!(
        preferences::get_preferences(&pool, house.id)
            .await
            .unwrap()
            .is_none()
    );

    let prefs = HouseholdPreferences {
        mode: MealSuggestionMode::UserOnly,
        cooking_time: CookingTime::Quick,
        meal_types: vec![MealType::Breakfast, MealType::Dinner],
        recurring: RecurringMeals {
            breakfast: vec!["eggs".into(), "oatmeal".into()],
            dinner: vec!["pasta".into()],
            ..Default::default()
        },
        notes: "no cilantro".into(),
    };
    preferences::upsert_preferences(&pool, house.id, &prefs)
        .await
        .unwrap();
    let fetched = preferences::get_preferences(&pool, house.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, prefs);

    let replaced = HouseholdPreferences::default();
    preferences::upsert_preferences(&pool, house.id, &replaced)
        .await
        .unwrap();
    let fetched = preferences::get_preferences(&pool, house.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, replaced);
    assert_eq!(fetched.mode, MealSuggestionMode::Hybrid);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn members_insert_list_delete() {
    let (pool, db_name) = create_test_db().await;
    let house = households::insert_household(&pool, "Members").await.unwrap();

    let recurring = RecurringMeals {
        dinner: vec!["nuggets".into()],
        ..Default::default()
    };
    let restrictions = vec!["vegetarian".to_string()];
    let jake = members::insert_member(
        &pool,
        &NewMember {
            household_id: house.id,
            name: "Jake",
            age: Some(7),
            dietary_restrictions: &restrictions,
            allergies: &[],
            shares_adult_meals: false,
            recurring: &recurring,
        },
    )
    .await
    .unwrap();
    assert_eq!(jake.recurring.dinner, vec!["nuggets".to_string()]);
    assert!(!jake.shares_adult_meals);

    members::insert_member(
        &pool,
        &NewMember {
            household_id: house.id,
            name: "Ana",
            age: None,
            dietary_restrictions: &[],
            allergies: &[],
            shares_adult_meals: true,
            recurring: &RecurringMeals::default(),
        },
    )
    .await
    .unwrap();

    let listed = members::list_members(&pool, house.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], jake);

    members::delete_member(&pool, house.id, jake.id).await.unwrap();
    assert!(members::delete_member(&pool, house.id, jake.id).await.is_err());
    assert_eq!(members::list_members(&pool, house.id).await.unwrap().len(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}
