//! Spoonacular-backed recipe source.
//!
//! Uses two endpoints:
//! - `GET /mealplanner/generate?timeFrame=week` for full-week batches.
//! - `GET /recipes/complexSearch` for single meal-type swap candidates.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use hoh_db::models::MealType;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{DietParams, RecipeCandidate, RecipeError, RecipeSource, WeekBatch};

pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";
const IMAGE_BASE_URL: &str = "https://img.spoonacular.com/recipes";
const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// HTTP client for the Spoonacular API.
pub struct SpoonacularClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl SpoonacularClient {
    /// Create a client. Every request is bounded by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RecipeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecipeError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        mut query: Vec<(&'static str, String)>,
    ) -> Result<T, RecipeError> {
        let url = format!("{}{path}", self.base_url);
        query.push(("apiKey", self.api_key.clone()));

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RecipeError::Malformed(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> RecipeError {
        if err.is_timeout() {
            RecipeError::Timeout(self.timeout)
        } else {
            RecipeError::Request(err.to_string())
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> RecipeError {
    let detail = if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    };
    match status {
        StatusCode::PAYMENT_REQUIRED | StatusCode::TOO_MANY_REQUESTS => {
            RecipeError::QuotaExceeded(detail)
        }
        _ => RecipeError::Request(detail),
    }
}

/// The Spoonacular `type` filter for a meal type.
fn search_type(meal_type: MealType) -> &'static str {
    match meal_type {
        MealType::Breakfast => "breakfast",
        MealType::Lunch | MealType::Dinner => "main course",
        MealType::Snack => "snack",
    }
}

fn diet_query(params: &DietParams) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(diet) = &params.diet {
        query.push(("diet", diet.clone()));
    }
    if let Some(exclude) = &params.exclude {
        query.push(("exclude", exclude.clone()));
    }
    query
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WeekResponse {
    week: HashMap<String, DayPlan>,
}

#[derive(Debug, Deserialize)]
struct DayPlan {
    #[serde(default)]
    meals: Vec<PlannedMeal>,
}

// Metadata fields are optional on the wire; a recipe missing any of them is
// withheld rather than padded with placeholder values.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlannedMeal {
    id: i64,
    title: String,
    image_type: Option<String>,
    ready_in_minutes: Option<u32>,
    servings: Option<u32>,
    source_url: Option<String>,
}

impl PlannedMeal {
    fn into_candidate(self) -> Option<RecipeCandidate> {
        let ext = self.image_type.as_deref().unwrap_or("jpg");
        let image = format!("{IMAGE_BASE_URL}/{}-556x370.{ext}", self.id);
        let candidate = RecipeCandidate {
            image,
            id: self.id,
            title: self.title,
            ready_in_minutes: self.ready_in_minutes?,
            servings: self.servings?,
            source_url: self.source_url.filter(|url| !url.is_empty())?,
        };
        Some(candidate)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    id: i64,
    title: String,
    image: Option<String>,
    ready_in_minutes: Option<u32>,
    servings: Option<u32>,
    source_url: Option<String>,
}

impl SearchResult {
    fn into_candidate(self) -> Option<RecipeCandidate> {
        Some(RecipeCandidate {
            id: self.id,
            title: self.title,
            image: self.image.filter(|url| !url.is_empty())?,
            ready_in_minutes: self.ready_in_minutes?,
            servings: self.servings?,
            source_url: self.source_url.filter(|url| !url.is_empty())?,
        })
    }
}

// ---------------------------------------------------------------------------
// RecipeSource
// ---------------------------------------------------------------------------

#[async_trait]
impl RecipeSource for SpoonacularClient {
    fn name(&self) -> &str {
        "spoonacular"
    }

    async fn generate_week(&self, params: &DietParams) -> Result<WeekBatch, RecipeError> {
        let mut query = vec![("timeFrame", "week".to_string())];
        query.extend(diet_query(params));

        let mut response: WeekResponse = self.get("/mealplanner/generate", query).await?;

        let mut batch = WeekBatch::default();
        for (index, day) in WEEKDAYS.iter().enumerate() {
            if let Some(plan) = response.week.remove(*day) {
                batch.set_day(index, plan.meals.into_iter().map(PlannedMeal::into_candidate));
            }
        }
        if batch.is_empty() {
            return Err(RecipeError::Malformed("week plan has no complete meals".into()));
        }
        // The meal planner endpoint takes no ready-time filter.
        if let Some(max) = params.max_ready_minutes {
            batch.cap_ready_time(max);
        }

        debug!(diet = ?params.diet, "generated week batch");
        Ok(batch)
    }

    async fn search_batch(
        &self,
        params: &DietParams,
        meal_type: MealType,
        count: u32,
        offset: u32,
    ) -> Result<Vec<RecipeCandidate>, RecipeError> {
        let mut query = vec![
            ("addRecipeInformation", "true".to_string()),
            ("type", search_type(meal_type).to_string()),
            ("number", count.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(diet) = &params.diet {
            query.push(("diet", diet.clone()));
        }
        if let Some(exclude) = &params.exclude {
            query.push(("intolerances", exclude.clone()));
        }
        if let Some(max) = params.max_ready_minutes {
            query.push(("maxReadyTime", max.to_string()));
        }

        let response: SearchResponse = self.get("/recipes/complexSearch", query).await?;
        let returned = response.results.len();
        let candidates: Vec<RecipeCandidate> = response
            .results
            .into_iter()
            .filter_map(SearchResult::into_candidate)
            .collect();
        debug!(
            %meal_type,
            offset,
            returned,
            complete = candidates.len(),
            "searched recipes"
        );
        Ok(candidates)
    }
}
