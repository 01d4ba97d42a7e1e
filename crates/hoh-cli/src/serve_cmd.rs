//! `hoh serve`: the meal plan HTTP API.
//!
//! Routes:
//! - `POST /api/plans`                     -- generate a week
//! - `GET  /api/plans/current`             -- plan covering today, else latest
//! - `GET  /api/plans/{start_date}`        -- plan for one week
//! - `POST /api/plans/{start_date}/slots`  -- swap or override one slot
//!
//! The caller is identified by the `x-hoh-user` header.

use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{FromRequest, FromRequestParts, Path, Request, State};
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use tower_http::cors::CorsLayer;

use hoh_core::plan::request::parse_date;
use hoh_core::plan::{GeneratePlanRequest, SlotEditRequest};
use hoh_core::store::Requester;
use hoh_core::{MealPlanError, MealPlanService};

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "x-hoh-user";

/// Seconds a client should wait after the recipe quota is exhausted.
const RETRY_AFTER_SECS: &str = "60";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }
}

impl From<MealPlanError> for AppError {
    fn from(err: MealPlanError) -> Self {
        let status = match &err {
            MealPlanError::Validation(_) => StatusCode::BAD_REQUEST,
            MealPlanError::State(_) => StatusCode::CONFLICT,
            MealPlanError::NotFound(_) => StatusCode::NOT_FOUND,
            MealPlanError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            MealPlanError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MealPlanError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        let mut response = (self.status, Json(body)).into_response();
        if self.status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// The requester named by the `x-hoh-user` header, resolved once per request.
pub struct Caller(pub Requester);

impl FromRequestParts<MealPlanService> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        service: &MealPlanService,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::unauthorized(format!("missing {USER_HEADER} header")))?;

        let requester = service.resolve_requester(user_id).await?;
        Ok(Self(requester))
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// `Json<T>` whose rejections come back as validation errors.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(MealPlanError::validation(rejection.body_text()).into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(service: MealPlanService) -> Router {
    Router::new()
        .route("/api/plans", post(generate_plan))
        .route("/api/plans/current", get(current_plan))
        .route("/api/plans/{start_date}", get(plan_for_week))
        .route("/api/plans/{start_date}/slots", post(edit_slot))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(service: MealPlanService, bind: &str, port: u16) -> Result<()> {
    let app = build_router(service);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("hoh serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("hoh serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate_plan(
    State(service): State<MealPlanService>,
    Caller(requester): Caller,
    JsonBody(request): JsonBody<GeneratePlanRequest>,
) -> Result<axum::response::Response, AppError> {
    let plan = service.generate(&requester, &request).await?;
    Ok((StatusCode::CREATED, Json(plan)).into_response())
}

async fn current_plan(
    State(service): State<MealPlanService>,
    Caller(requester): Caller,
) -> Result<axum::response::Response, AppError> {
    let today = Utc::now().date_naive();
    let plan = service
        .current_plan(requester.household_id, today)
        .await?
        .ok_or_else(|| MealPlanError::not_found("no meal plans yet"))?;
    Ok(Json(plan).into_response())
}

async fn plan_for_week(
    State(service): State<MealPlanService>,
    Caller(requester): Caller,
    Path(start_date): Path<String>,
) -> Result<axum::response::Response, AppError> {
    let start = parse_date("startDate", &start_date).map_err(MealPlanError::from)?;
    let plan = service.plan_for_week(requester.household_id, start).await?;
    Ok(Json(plan).into_response())
}

async fn edit_slot(
    State(service): State<MealPlanService>,
    Caller(requester): Caller,
    Path(start_date): Path<String>,
    JsonBody(request): JsonBody<SlotEditRequest>,
) -> Result<axum::response::Response, AppError> {
    let start = parse_date("startDate", &start_date).map_err(MealPlanError::from)?;
    let plan = service
        .apply_slot_edit(&requester, start, &request)
        .await?;
    Ok(Json(plan).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Days, NaiveDate};
    use tower::ServiceExt;
    use uuid::Uuid;

    use hoh_core::{EngineConfig, MealPlanService};
    use hoh_db::models::{HouseholdPreferences, MealSuggestionMode, RecurringMeals};
    use hoh_test_utils::fakes::{
        InMemoryHouseholdStore, InMemoryPlanStore, ScriptedFailure, ScriptedRecipeSource,
        full_week, requester,
    };

    use super::USER_HEADER;

    struct TestApp {
        household_id: Uuid,
        service: MealPlanService,
        plans: Arc<InMemoryPlanStore>,
        recipes: Arc<ScriptedRecipeSource>,
    }

    fn app_with(prefs: HouseholdPreferences) -> TestApp {
        let household_id = Uuid::new_v4();
        let households = Arc::new(InMemoryHouseholdStore::new());
        households.set_preferences(household_id, prefs);
        households.add_requester(requester(household_id));

        let plans = Arc::new(InMemoryPlanStore::new());
        let recipes = Arc::new(ScriptedRecipeSource::new().with_default_week(full_week(1000, "Week")));
        let service = MealPlanService::new(
            households,
            plans.clone(),
            recipes.clone(),
            EngineConfig::default(),
        );
        TestApp {
            household_id,
            service,
            plans,
            recipes,
        }
    }

    fn user_only() -> HouseholdPreferences {
        HouseholdPreferences {
            mode: MealSuggestionMode::UserOnly,
            recurring: RecurringMeals {
                dinner: vec!["pasta".into(), "tacos".into()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send(
        app: &TestApp,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        super::build_router(app.service.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn generate(app: &TestApp, start: &str) -> axum::response::Response {
        send(
            app,
            "POST",
            "/api/plans",
            Some("user-1"),
            Some(serde_json::json!({ "startDate": start })),
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_identity_is_unauthorized() {
        let app = app_with(user_only());
        let resp = send(&app, "GET", "/api/plans/current", None, None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains(USER_HEADER));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = app_with(user_only());
        let resp = send(&app, "GET", "/api/plans/current", Some("stranger"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generate_returns_created_plan() {
        let app = app_with(user_only());
        let resp = generate(&app, "2025-01-06").await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let json = body_json(resp).await;
        assert_eq!(json["startDate"], "2025-01-06");
        assert_eq!(json["endDate"], "2025-01-12");
        let slots = json["slots"].as_array().unwrap();
        assert_eq!(slots.len(), 7);
        assert!(slots.iter().all(|s| s["mealType"] == "dinner"));
        assert_eq!(app.plans.put_count(), 1);
    }

    #[tokio::test]
    async fn invalid_start_date_is_bad_request() {
        let app = app_with(user_only());
        let resp = generate(&app, "01/06/2025").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.plans.put_count(), 0);

        let resp = send(&app, "POST", "/api/plans", Some("user-1"), Some(serde_json::json!({}))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("startDate"));
    }

    #[tokio::test]
    async fn unreadable_bodies_use_the_error_shape() {
        let app = app_with(user_only());

        let resp = send(
            &app,
            "POST",
            "/api/plans",
            Some("user-1"),
            Some(serde_json::json!({ "startDate": 5 })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().starts_with("invalid request"));

        generate(&app, "2025-01-06").await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/plans/2025-01-06/slots")
            .header(USER_HEADER, "user-1")
            .header("content-type", "application/json")
            .body(Body::from("{\"date\": "))
            .unwrap();
        let resp = super::build_router(app.service.clone())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].is_string());
        assert_eq!(app.plans.put_count(), 1);
    }

    #[tokio::test]
    async fn user_only_without_recurring_meals_is_conflict() {
        let app = app_with(HouseholdPreferences {
            mode: MealSuggestionMode::UserOnly,
            ..Default::default()
        });
        let resp = generate(&app, "2025-01-06").await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(app.recipes.total_calls(), 0);
    }

    #[tokio::test]
    async fn exhausted_quota_sets_retry_after() {
        let app = app_with(HouseholdPreferences::default());
        app.recipes.set_failure(ScriptedFailure::Quota);

        let resp = generate(&app, "2025-01-06").await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get("retry-after").unwrap(), "60");
        assert_eq!(app.plans.put_count(), 0);
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let app = app_with(HouseholdPreferences::default());
        app.recipes.set_failure(ScriptedFailure::Request);

        let resp = generate(&app, "2025-01-06").await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn store_failure_is_internal_error() {
        let app = app_with(user_only());
        app.plans.fail_puts();

        let resp = generate(&app, "2025-01-06").await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn week_and_current_lookups() {
        let app = app_with(user_only());

        let resp = send(&app, "GET", "/api/plans/current", Some("user-1"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        generate(&app, "2025-01-06").await;

        let resp = send(&app, "GET", "/api/plans/2025-01-06", Some("user-1"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["startDate"], "2025-01-06");

        // The only plan is returned as the most recent one.
        let resp = send(&app, "GET", "/api/plans/current", Some("user-1"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(&app, "GET", "/api/plans/2025-01-13", Some("user-1"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, "GET", "/api/plans/next-week", Some("user-1"), None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn set_custom_updates_one_slot() {
        let app = app_with(user_only());
        generate(&app, "2025-01-06").await;
        let before = app.plans.stored(app.household_id, monday()).unwrap();

        let wednesday = monday() + Days::new(2);
        let resp = send(
            &app,
            "POST",
            "/api/plans/2025-01-06/slots",
            Some("user-1"),
            Some(serde_json::json!({
                "date": wednesday.to_string(),
                "mealType": "dinner",
                "action": "setCustom",
                "name": "Grandma's lasagna",
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        let slots = json["slots"].as_array().unwrap();
        assert_eq!(slots[2]["title"], "Grandma's lasagna");
        assert_eq!(slots[2]["custom"], true);
        assert_eq!(slots[2]["updatedBy"], "user-1");
        for (i, slot) in slots.iter().enumerate() {
            if i != 2 {
                assert_eq!(slot["title"], before.slots[i].title.as_str());
            }
        }
    }

    #[tokio::test]
    async fn slot_edit_validation_and_missing_slots() {
        let app = app_with(user_only());
        generate(&app, "2025-01-06").await;

        let resp = send(
            &app,
            "POST",
            "/api/plans/2025-01-06/slots",
            Some("user-1"),
            Some(serde_json::json!({ "date": "2025-01-08", "mealType": "dinner", "action": "explode" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            "POST",
            "/api/plans/2025-01-06/slots",
            Some("user-1"),
            Some(serde_json::json!({ "date": "2025-01-08", "mealType": "lunch", "action": "swap" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
