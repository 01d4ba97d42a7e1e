//! Operator-mode CLI handlers for `hoh plan` subcommands.
//!
//! Implements:
//! - `hoh plan generate <start>`      -- generate (or regenerate) a week
//! - `hoh plan show [start]`          -- show a week, or the current plan
//! - `hoh plan swap <start> <date> <meal>`        -- replace one slot
//! - `hoh plan set-custom <start> <date> <meal> <name>` -- override one slot
//!
//! Every command acts on behalf of `--user`, whose linked household owns
//! the plan.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;

use hoh_core::MealPlanService;
use hoh_core::plan::{GeneratePlanRequest, SlotEditRequest};
use hoh_core::store::{PgStore, PlanStore};
use hoh_db::models::{MealPlan, MealSlot, Provenance};
use hoh_db::queries::households;

use crate::PlanCommands;
use crate::config::HohConfig;
use crate::resolve::parse_day;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, config: &HohConfig, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::Generate { user, start_date } => {
            let service = config.build_service(pool.clone())?;
            let requester = service.resolve_requester(&user).await?;
            let plan = service
                .generate(
                    &requester,
                    &GeneratePlanRequest {
                        start_date: Some(start_date),
                    },
                )
                .await?;
            println!("Plan generated.");
            println!();
            print_plan(&plan);
            Ok(())
        }
        PlanCommands::Show {
            user,
            start_date,
            json,
        } => cmd_show(pool, &user, start_date.as_deref(), json).await,
        PlanCommands::Swap {
            user,
            start_date,
            date,
            meal_type,
            member,
        } => {
            let request = SlotEditRequest {
                date: Some(date),
                meal_type: Some(meal_type),
                member_id: member,
                action: Some("swap".to_string()),
                name: None,
            };
            cmd_edit(config, pool, &user, &start_date, &request).await
        }
        PlanCommands::SetCustom {
            user,
            start_date,
            date,
            meal_type,
            name,
            member,
        } => {
            let request = SlotEditRequest {
                date: Some(date),
                meal_type: Some(meal_type),
                member_id: member,
                action: Some("setCustom".to_string()),
                name: Some(name),
            };
            cmd_edit(config, pool, &user, &start_date, &request).await
        }
    }
}

// -----------------------------------------------------------------------
// hoh plan show
// -----------------------------------------------------------------------

/// Reads go straight to the store: no recipe service is needed to look.
async fn cmd_show(pool: &PgPool, user: &str, start_date: Option<&str>, json: bool) -> Result<()> {
    let profile = households::get_user_profile(pool, user)
        .await?
        .with_context(|| format!("user {user:?} has no household"))?;
    let store = PgStore::new(pool.clone());

    let plan = match start_date {
        Some(raw) => {
            let start = parse_day(raw)?;
            store
                .get(profile.household_id, start)
                .await?
                .with_context(|| format!("no meal plan for week {start}"))?
        }
        None => {
            let today = Utc::now().date_naive();
            match store.current(profile.household_id, today).await? {
                Some(plan) => plan,
                None => {
                    println!("No meal plans yet. Use `hoh plan generate` to create one.");
                    return Ok(());
                }
            }
        }
    };

    if json {
        let rendered =
            serde_json::to_string_pretty(&plan).context("failed to serialize meal plan")?;
        println!("{rendered}");
    } else {
        print_plan(&plan);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// hoh plan swap / set-custom
// -----------------------------------------------------------------------

async fn cmd_edit(
    config: &HohConfig,
    pool: &PgPool,
    user: &str,
    start_date: &str,
    request: &SlotEditRequest,
) -> Result<()> {
    let start = parse_day(start_date)?;
    let service: MealPlanService = config.build_service(pool.clone())?;
    let requester = service.resolve_requester(user).await?;
    let plan = service.apply_slot_edit(&requester, start, request).await?;

    println!("Slot updated.");
    println!();
    print_plan(&plan);
    Ok(())
}

// -----------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------

fn source_label(slot: &MealSlot) -> &'static str {
    match (slot.custom, slot.provenance) {
        (true, _) => "custom",
        (false, Provenance::UserPreference) => "recurring",
        (false, Provenance::ExternalSuggestion) => "suggested",
    }
}

fn print_plan(plan: &MealPlan) {
    println!("Meal plan {} .. {} ({})", plan.start_date, plan.end_date, plan.mode);
    println!(
        "  Updated: {}",
        plan.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mut current_day = None;
    for slot in &plan.slots {
        if current_day != Some(slot.date) {
            current_day = Some(slot.date);
            println!();
            println!("  {}", slot.date.format("%A %Y-%m-%d"));
        }
        let who = slot
            .member_name
            .as_deref()
            .map(|name| format!(" [{name}]"))
            .unwrap_or_default();
        let minutes = slot
            .ready_in_minutes
            .map(|m| format!(", {m} min"))
            .unwrap_or_default();
        println!(
            "    {:<10} {}{who} ({}{minutes})",
            slot.meal_type.to_string(),
            slot.title,
            source_label(slot),
        );
    }
}
