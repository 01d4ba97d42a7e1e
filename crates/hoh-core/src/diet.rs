//! Dietary aggregation: merges member constraints into cohorts and reduces
//! each cohort to the parameters the recipe service understands.
//!
//! The shared cohort is everyone who eats the adult meals (plus the
//! requesting user when planning for the whole household). Every member who
//! does not share adult meals forms a cohort of their own; separate cohorts
//! are never merged with each other here.

use std::collections::BTreeSet;

use hoh_db::models::{CookingTime, FamilyMember};

use crate::recipes::DietParams;

/// Diet tokens in priority order: the first one a cohort matches wins.
///
/// Each entry lists the accepted spellings and the token sent upstream.
const DIET_PRIORITY: &[(&[&str], &str)] = &[
    (&["vegetarian"], "vegetarian"),
    (&["vegan"], "vegan"),
    (&["gluten-free", "gluten free", "glutenfree"], "gluten free"),
    (&["dairy-free", "dairy free", "dairyfree"], "dairy free"),
    (&["keto", "ketogenic"], "ketogenic"),
    (&["paleo"], "paleo"),
];

/// Restrictions and allergies of one cohort, normalized to trimmed
/// lowercase and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DietaryNeeds {
    pub restrictions: BTreeSet<String>,
    pub allergies: BTreeSet<String>,
}

impl DietaryNeeds {
    /// Build from raw restriction and allergy lists.
    pub fn new<S: AsRef<str>>(restrictions: &[S], allergies: &[S]) -> Self {
        let mut needs = Self::default();
        needs.absorb(restrictions, allergies);
        needs
    }

    /// The constraints of a single member.
    pub fn of_member(member: &FamilyMember) -> Self {
        Self::new(&member.dietary_restrictions, &member.allergies)
    }

    /// Add raw restrictions and allergies to this cohort.
    pub fn absorb<S: AsRef<str>>(&mut self, restrictions: &[S], allergies: &[S]) {
        self.restrictions.extend(restrictions.iter().filter_map(normalize));
        self.allergies.extend(allergies.iter().filter_map(normalize));
    }

    /// Union another cohort's constraints into this one.
    pub fn merge(&mut self, other: &DietaryNeeds) {
        self.restrictions.extend(other.restrictions.iter().cloned());
        self.allergies.extend(other.allergies.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.restrictions.is_empty() && self.allergies.is_empty()
    }

    /// Reduce the restrictions to a single upstream diet token.
    ///
    /// Lossy: only the highest-priority match survives, and restrictions
    /// outside the known vocabulary are dropped.
    pub fn diet_token(&self) -> Option<&'static str> {
        DIET_PRIORITY.iter().find_map(|(spellings, token)| {
            spellings
                .iter()
                .any(|s| self.restrictions.contains(*s))
                .then_some(*token)
        })
    }

    /// Allergies joined into a single comma-separated exclusion string.
    pub fn exclusion(&self) -> Option<String> {
        if self.allergies.is_empty() {
            None
        } else {
            Some(self.allergies.iter().cloned().collect::<Vec<_>>().join(","))
        }
    }

    /// Parameters for a recipe service request on behalf of this cohort.
    pub fn to_params(&self, cooking_time: CookingTime) -> DietParams {
        DietParams {
            diet: self.diet_token().map(str::to_owned),
            exclude: self.exclusion(),
            max_ready_minutes: cooking_time.max_ready_minutes(),
        }
    }
}

fn normalize<S: AsRef<str>>(raw: &S) -> Option<String> {
    let value = raw.as_ref().trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

/// A member who eats separately, with their own constraints.
#[derive(Debug, Clone)]
pub struct SeparateCohort<'a> {
    pub member: &'a FamilyMember,
    pub needs: DietaryNeeds,
}

/// The result of aggregating a household.
#[derive(Debug, Clone)]
pub struct Cohorts<'a> {
    pub shared: DietaryNeeds,
    /// One entry per member with `shares_adult_meals = false`, in member order.
    pub separate: Vec<SeparateCohort<'a>>,
}

impl Cohorts<'_> {
    /// Union of every separate cohort's constraints, or `None` when every
    /// member shares the adult meals.
    ///
    /// Used for the single suggestion batch that serves all separate
    /// cohorts during full-week generation.
    pub fn separate_union(&self) -> Option<DietaryNeeds> {
        if self.separate.is_empty() {
            return None;
        }
        let mut union = DietaryNeeds::default();
        for cohort in &self.separate {
            union.merge(&cohort.needs);
        }
        Some(union)
    }
}

/// Partition members into the shared cohort and separate cohorts.
///
/// `requester` joins the shared cohort; pass `None` when the aggregation is
/// scoped to something other than the whole household.
pub fn aggregate<'a>(members: &'a [FamilyMember], requester: Option<&DietaryNeeds>) -> Cohorts<'a> {
    let mut shared = DietaryNeeds::default();
    if let Some(needs) = requester {
        shared.merge(needs);
    }

    let mut separate = Vec::new();
    for member in members {
        if member.shares_adult_meals {
            shared.absorb(&member.dietary_restrictions, &member.allergies);
        } else {
            separate.push(SeparateCohort {
                member,
                needs: DietaryNeeds::of_member(member),
            });
        }
    }

    Cohorts { shared, separate }
}
