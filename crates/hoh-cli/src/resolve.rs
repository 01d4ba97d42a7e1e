//! Argument parsing shared by the command handlers.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use uuid::Uuid;

/// Parse a UUID argument, naming what it identifies on failure.
pub fn parse_id(kind: &str, input: &str) -> Result<Uuid> {
    Uuid::parse_str(input.trim()).with_context(|| format!("invalid {kind} ID: {input:?}"))
}

/// Parse a `YYYY-MM-DD` argument.
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date {input:?} (expected YYYY-MM-DD)"))
}

/// Trim list entries and drop blanks, as typed on the command line.
pub fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
