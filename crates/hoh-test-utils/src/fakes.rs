//! In-memory fakes of the engine's collaborator traits.
//!
//! Every fake records the calls it receives so tests can assert on what the
//! engine asked for (and that it asked for nothing at all on failure paths).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use hoh_core::diet::DietaryNeeds;
use hoh_core::recipes::{DietParams, RecipeCandidate, RecipeError, RecipeSource, WeekBatch};
use hoh_core::store::{HouseholdStore, PlanStore, Requester};
use hoh_db::models::{FamilyMember, HouseholdPreferences, MealPlan, MealType};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A candidate with every field filled from `id`.
pub fn candidate(id: i64, title: &str) -> RecipeCandidate {
    RecipeCandidate {
        id,
        title: title.to_string(),
        image: format!("https://img.example/{id}.jpg"),
        ready_in_minutes: 20,
        servings: 4,
        source_url: format!("https://recipes.example/{id}"),
    }
}

/// A full week: three meals per weekday with ids `base + day * 10 + position`.
pub fn full_week(base: i64, label: &str) -> WeekBatch {
    let mut batch = WeekBatch::default();
    for day in 0..7 {
        let meals = ["breakfast", "lunch", "dinner"]
            .iter()
            .enumerate()
            .map(|(pos, meal)| {
                let id = base + day as i64 * 10 + pos as i64;
                candidate(id, &format!("{label} {meal} {day}"))
            });
        batch.set_day(day, meals);
    }
    batch
}

/// A household member with no recurring meals.
pub fn member(name: &str, restrictions: &[&str], allergies: &[&str], shares: bool) -> FamilyMember {
    FamilyMember {
        id: Uuid::new_v4(),
        household_id: Uuid::nil(),
        name: name.to_string(),
        age: None,
        dietary_restrictions: restrictions.iter().map(|s| s.to_string()).collect(),
        allergies: allergies.iter().map(|s| s.to_string()).collect(),
        shares_adult_meals: shares,
        recurring: Default::default(),
    }
}

/// A requester for `household_id` with no constraints.
pub fn requester(household_id: Uuid) -> Requester {
    Requester {
        user_id: "user-1".to_string(),
        household_id,
        needs: DietaryNeeds::default(),
    }
}

// ---------------------------------------------------------------------------
// Household store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryHouseholdStore {
    preferences: Mutex<HashMap<Uuid, HouseholdPreferences>>,
    members: Mutex<HashMap<Uuid, Vec<FamilyMember>>>,
    requesters: Mutex<HashMap<String, Requester>>,
}

impl InMemoryHouseholdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_preferences(&self, household_id: Uuid, prefs: HouseholdPreferences) {
        self.preferences
            .lock()
            .unwrap()
            .insert(household_id, prefs);
    }

    /// Add a member, re-homing it to `household_id`. Returns the stored copy.
    pub fn add_member(&self, household_id: Uuid, mut member: FamilyMember) -> FamilyMember {
        member.household_id = household_id;
        self.members
            .lock()
            .unwrap()
            .entry(household_id)
            .or_default()
            .push(member.clone());
        member
    }

    pub fn remove_member(&self, household_id: Uuid, member_id: Uuid) {
        if let Some(list) = self.members.lock().unwrap().get_mut(&household_id) {
            list.retain(|m| m.id != member_id);
        }
    }

    pub fn add_requester(&self, requester: Requester) {
        self.requesters
            .lock()
            .unwrap()
            .insert(requester.user_id.clone(), requester);
    }
}

#[async_trait]
impl HouseholdStore for InMemoryHouseholdStore {
    async fn preferences(&self, household_id: Uuid) -> Result<HouseholdPreferences> {
        Ok(self
            .preferences
            .lock()
            .unwrap()
            .get(&household_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn members(&self, household_id: Uuid) -> Result<Vec<FamilyMember>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&household_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn requester(&self, user_id: &str) -> Result<Option<Requester>> {
        Ok(self.requesters.lock().unwrap().get(user_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Plan store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: Mutex<HashMap<(Uuid, NaiveDate), MealPlan>>,
    puts: Mutex<usize>,
    fail_puts: Mutex<bool>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a plan without counting it as a write.
    pub fn seed(&self, plan: MealPlan) {
        self.plans
            .lock()
            .unwrap()
            .insert((plan.household_id, plan.start_date), plan);
    }

    /// Number of `put` calls that succeeded.
    pub fn put_count(&self) -> usize {
        *self.puts.lock().unwrap()
    }

    /// Make every subsequent `put` fail.
    pub fn fail_puts(&self) {
        *self.fail_puts.lock().unwrap() = true;
    }

    /// The stored plan regardless of expiry.
    pub fn stored(&self, household_id: Uuid, start_date: NaiveDate) -> Option<MealPlan> {
        self.plans
            .lock()
            .unwrap()
            .get(&(household_id, start_date))
            .cloned()
    }

    fn live(&self, household_id: Uuid) -> Vec<MealPlan> {
        let now = Utc::now();
        self.plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.household_id == household_id && p.expires_at > now)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PlanStore for InMemoryPlanStore {
    async fn get(&self, household_id: Uuid, start_date: NaiveDate) -> Result<Option<MealPlan>> {
        Ok(self
            .live(household_id)
            .into_iter()
            .find(|p| p.start_date == start_date))
    }

    async fn put(&self, plan: &MealPlan) -> Result<()> {
        if *self.fail_puts.lock().unwrap() {
            bail!("plan store unavailable");
        }
        self.seed(plan.clone());
        *self.puts.lock().unwrap() += 1;
        Ok(())
    }

    async fn current(&self, household_id: Uuid, today: NaiveDate) -> Result<Option<MealPlan>> {
        let live = self.live(household_id);
        let covering = live
            .iter()
            .filter(|p| p.covers(today))
            .max_by_key(|p| p.start_date)
            .cloned();
        Ok(covering.or_else(|| live.into_iter().max_by_key(|p| p.start_date)))
    }
}

// ---------------------------------------------------------------------------
// Recipe source
// ---------------------------------------------------------------------------

/// A failure the scripted source should produce for every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Quota,
    Request,
    /// Sleep for an hour, so the caller's timeout fires.
    Hang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub params: DietParams,
    pub meal_type: MealType,
    pub count: u32,
    pub offset: u32,
}

/// A recipe source that answers from pre-loaded data.
///
/// Week batches are keyed by the requested diet token; a request for an
/// unscripted diet gets the default week. Search calls pop queued result
/// sets in order, then fall back to the default result set.
#[derive(Default)]
pub struct ScriptedRecipeSource {
    weeks: Mutex<HashMap<Option<String>, WeekBatch>>,
    default_week: Mutex<WeekBatch>,
    searches: Mutex<VecDeque<Vec<RecipeCandidate>>>,
    default_search: Mutex<Vec<RecipeCandidate>>,
    failure: Mutex<Option<ScriptedFailure>>,
    week_calls: Mutex<Vec<DietParams>>,
    search_calls: Mutex<Vec<SearchCall>>,
}

impl ScriptedRecipeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_week(self, batch: WeekBatch) -> Self {
        *self.default_week.lock().unwrap() = batch;
        self
    }

    /// Answer week requests with `diet = diet` using `batch`.
    pub fn with_week_for(self, diet: Option<&str>, batch: WeekBatch) -> Self {
        self.weeks
            .lock()
            .unwrap()
            .insert(diet.map(str::to_owned), batch);
        self
    }

    pub fn with_search(self, results: Vec<RecipeCandidate>) -> Self {
        self.searches.lock().unwrap().push_back(results);
        self
    }

    pub fn with_default_search(self, results: Vec<RecipeCandidate>) -> Self {
        self.set_default_search(results);
        self
    }

    pub fn failing(self, failure: ScriptedFailure) -> Self {
        self.set_failure(failure);
        self
    }

    /// Replace the default search results on a shared source.
    pub fn set_default_search(&self, results: Vec<RecipeCandidate>) {
        *self.default_search.lock().unwrap() = results;
    }

    /// Make every subsequent call fail.
    pub fn set_failure(&self, failure: ScriptedFailure) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    pub fn week_calls(&self) -> Vec<DietParams> {
        self.week_calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.week_calls.lock().unwrap().len() + self.search_calls.lock().unwrap().len()
    }

    async fn scripted_failure(&self) -> Option<RecipeError> {
        let failure = *self.failure.lock().unwrap();
        match failure? {
            ScriptedFailure::Quota => Some(RecipeError::QuotaExceeded("HTTP 402".into())),
            ScriptedFailure::Request => Some(RecipeError::Request("HTTP 500".into())),
            ScriptedFailure::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Some(RecipeError::Request("hung".into()))
            }
        }
    }
}

#[async_trait]
impl RecipeSource for ScriptedRecipeSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_week(&self, params: &DietParams) -> Result<WeekBatch, RecipeError> {
        self.week_calls.lock().unwrap().push(params.clone());
        if let Some(err) = self.scripted_failure().await {
            return Err(err);
        }
        let scripted = self.weeks.lock().unwrap().get(&params.diet).cloned();
        Ok(scripted.unwrap_or_else(|| self.default_week.lock().unwrap().clone()))
    }

    async fn search_batch(
        &self,
        params: &DietParams,
        meal_type: MealType,
        count: u32,
        offset: u32,
    ) -> Result<Vec<RecipeCandidate>, RecipeError> {
        self.search_calls.lock().unwrap().push(SearchCall {
            params: params.clone(),
            meal_type,
            count,
            offset,
        });
        if let Some(err) = self.scripted_failure().await {
            return Err(err);
        }
        let queued = self.searches.lock().unwrap().pop_front();
        Ok(queued.unwrap_or_else(|| self.default_search.lock().unwrap().clone()))
    }
}
