//! Request payloads for generation and slot edits.
//!
//! Wire payloads keep every field optional and loosely typed so that a
//! missing or malformed field surfaces as a [`RequestError`] rather than a
//! deserialization failure. `validate` turns them into the typed forms the
//! engine consumes.

use chrono::NaiveDate;
use hoh_db::models::{MealType, ParseEnumError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a request payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("`{field}` is not a valid date (expected YYYY-MM-DD): {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("{0}")]
    InvalidMealType(String),

    #[error("`memberId` is not a valid id: {0:?}")]
    InvalidMemberId(String),

    #[error("unknown action {0:?} (expected \"swap\" or \"setCustom\")")]
    UnknownAction(String),

    #[error("`name` must not be empty for setCustom")]
    EmptyName,
}

impl From<ParseEnumError> for RequestError {
    fn from(err: ParseEnumError) -> Self {
        Self::InvalidMealType(err.to_string())
    }
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RequestError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, RequestError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RequestError::MissingField(field)),
    }
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

/// Body of a generate request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    pub start_date: Option<String>,
}

impl GeneratePlanRequest {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date.format("%Y-%m-%d").to_string()),
        }
    }

    pub fn validate(&self) -> Result<NaiveDate, RequestError> {
        parse_date("startDate", required("startDate", &self.start_date)?)
    }
}

// ---------------------------------------------------------------------------
// Slot edits
// ---------------------------------------------------------------------------

/// Body of a slot edit request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEditRequest {
    pub date: Option<String>,
    pub meal_type: Option<String>,
    pub member_id: Option<String>,
    pub action: Option<String>,
    pub name: Option<String>,
}

/// Where a slot sits within a plan. `member_id = None` addresses the shared
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAddress {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAction {
    /// Replace with a different recurring meal or external suggestion.
    Swap,
    /// Overwrite with a literal, user-typed meal name.
    SetCustom { name: String },
}

/// A validated slot edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEdit {
    pub address: SlotAddress,
    pub action: SlotAction,
}

impl SlotEditRequest {
    pub fn validate(&self) -> Result<SlotEdit, RequestError> {
        let date = parse_date("date", required("date", &self.date)?)?;
        let meal_type: MealType = required("mealType", &self.meal_type)?.parse()?;

        let member_id = match self.member_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Uuid::parse_str(raw).map_err(|_| RequestError::InvalidMemberId(raw.to_string()))?,
            ),
        };

        let action = match required("action", &self.action)? {
            "swap" => SlotAction::Swap,
            "setCustom" | "set_custom" => {
                let name = self.name.as_deref().map(str::trim).unwrap_or_default();
                if name.is_empty() {
                    return Err(RequestError::EmptyName);
                }
                SlotAction::SetCustom {
                    name: name.to_string(),
                }
            }
            other => return Err(RequestError::UnknownAction(other.to_string())),
        };

        Ok(SlotEdit {
            address: SlotAddress {
                date,
                meal_type,
                member_id,
            },
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(action: &str) -> SlotEditRequest {
        SlotEditRequest {
            date: Some("2025-01-07".into()),
            meal_type: Some("Dinner".into()),
            member_id: None,
            action: Some(action.into()),
            name: None,
        }
    }

    #[test]
    fn generate_requires_valid_start_date() {
        assert_eq!(
            GeneratePlanRequest::default().validate(),
            Err(RequestError::MissingField("startDate"))
        );
        let bad = GeneratePlanRequest {
            start_date: Some("2025-02-30".into()),
        };
        assert!(matches!(
            bad.validate(),
            Err(RequestError::InvalidDate { field: "startDate", .. })
        ));
        let ok = GeneratePlanRequest::new(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        assert_eq!(ok.validate().unwrap().to_string(), "2025-01-06");
    }

    #[test]
    fn swap_parses_address() {
        let parsed = edit("swap").validate().unwrap();
        assert_eq!(parsed.action, SlotAction::Swap);
        assert_eq!(parsed.address.meal_type, MealType::Dinner);
        assert_eq!(parsed.address.member_id, None);
    }

    #[test]
    fn member_id_must_be_uuid() {
        let mut req = edit("swap");
        req.member_id = Some("jake".into());
        assert_eq!(
            req.validate(),
            Err(RequestError::InvalidMemberId("jake".into()))
        );

        let id = Uuid::new_v4();
        req.member_id = Some(id.to_string());
        assert_eq!(req.validate().unwrap().address.member_id, Some(id));
    }

    #[test]
    fn set_custom_requires_name() {
        let mut req = edit("setCustom");
        assert_eq!(req.validate(), Err(RequestError::EmptyName));
        req.name = Some("   ".into());
        assert_eq!(req.validate(), Err(RequestError::EmptyName));
        req.name = Some(" Grandma's lasagna ".into());
        assert_eq!(
            req.validate().unwrap().action,
            SlotAction::SetCustom {
                name: "Grandma's lasagna".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_action_and_meal_type() {
        assert!(matches!(
            edit("delete").validate(),
            Err(RequestError::UnknownAction(_))
        ));
        let mut req = edit("swap");
        req.meal_type = Some("brunch".into());
        assert!(matches!(req.validate(), Err(RequestError::InvalidMealType(_))));
        req.meal_type = None;
        assert_eq!(req.validate(), Err(RequestError::MissingField("mealType")));
    }
}
