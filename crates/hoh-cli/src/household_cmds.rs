//! `hoh household` subcommands: create households and link users to them.

use anyhow::{Context, Result};
use sqlx::PgPool;

use hoh_db::queries::households;

use crate::HouseholdCommands;
use crate::resolve::{clean_list, parse_id};

pub async fn run_household_command(command: HouseholdCommands, pool: &PgPool) -> Result<()> {
    match command {
        HouseholdCommands::Create { name } => cmd_create(pool, &name).await,
        HouseholdCommands::LinkUser {
            user_id,
            household_id,
            restrictions,
            allergies,
        } => {
            cmd_link_user(
                pool,
                &user_id,
                &household_id,
                clean_list(restrictions),
                clean_list(allergies),
            )
            .await
        }
    }
}

async fn cmd_create(pool: &PgPool, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("household name must not be empty");
    }
    let household = households::insert_household(pool, name).await?;

    println!("Household created.");
    println!("  ID:   {}", household.id);
    println!("  Name: {}", household.name);
    println!();
    println!("Next: `hoh household link-user <user-id> {}`", household.id);
    Ok(())
}

async fn cmd_link_user(
    pool: &PgPool,
    user_id: &str,
    household_id: &str,
    restrictions: Vec<String>,
    allergies: Vec<String>,
) -> Result<()> {
    let household_id = parse_id("household", household_id)?;
    let household = households::get_household(pool, household_id)
        .await?
        .with_context(|| format!("household {household_id} not found"))?;

    let profile =
        households::upsert_user_profile(pool, user_id, household.id, &restrictions, &allergies)
            .await?;

    println!("Linked {} to household {:?}.", profile.user_id, household.name);
    if !profile.dietary_restrictions.is_empty() {
        println!("  Restrictions: {}", profile.dietary_restrictions.join(", "));
    }
    if !profile.allergies.is_empty() {
        println!("  Allergies:    {}", profile.allergies.join(", "));
    }
    Ok(())
}
