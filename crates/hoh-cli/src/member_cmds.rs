//! `hoh member` subcommands.

use anyhow::Result;
use sqlx::PgPool;

use hoh_db::models::{FamilyMember, RecurringMeals};
use hoh_db::queries::members::{self, NewMember};

use crate::MemberCommands;
use crate::resolve::{clean_list, parse_id};

pub async fn run_member_command(command: MemberCommands, pool: &PgPool) -> Result<()> {
    match command {
        MemberCommands::Add {
            household_id,
            name,
            age,
            restrictions,
            allergies,
            separate,
            dinner,
        } => {
            let household_id = parse_id("household", &household_id)?;
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("member name must not be empty");
            }
            let recurring = RecurringMeals {
                dinner: clean_list(dinner),
                ..Default::default()
            };
            let restrictions = clean_list(restrictions);
            let allergies = clean_list(allergies);

            let member = members::insert_member(
                pool,
                &NewMember {
                    household_id,
                    name,
                    age,
                    dietary_restrictions: &restrictions,
                    allergies: &allergies,
                    shares_adult_meals: !separate,
                    recurring: &recurring,
                },
            )
            .await?;

            println!("Member added.");
            print_member(&member);
            Ok(())
        }
        MemberCommands::List { household_id } => {
            let household_id = parse_id("household", &household_id)?;
            let listed = members::list_members(pool, household_id).await?;
            if listed.is_empty() {
                println!("No members. Use `hoh member add` to add one.");
                return Ok(());
            }
            for member in &listed {
                print_member(member);
                println!();
            }
            Ok(())
        }
        MemberCommands::Remove {
            household_id,
            member_id,
        } => {
            let household_id = parse_id("household", &household_id)?;
            let member_id = parse_id("member", &member_id)?;
            members::delete_member(pool, household_id, member_id).await?;
            println!("Member {member_id} removed.");
            Ok(())
        }
    }
}

fn print_member(member: &FamilyMember) {
    let cohort = if member.shares_adult_meals {
        "shared"
    } else {
        "separate"
    };
    println!("  {} ({cohort})", member.name);
    println!("    ID:           {}", member.id);
    if let Some(age) = member.age {
        println!("    Age:          {age}");
    }
    if !member.dietary_restrictions.is_empty() {
        println!("    Restrictions: {}", member.dietary_restrictions.join(", "));
    }
    if !member.allergies.is_empty() {
        println!("    Allergies:    {}", member.allergies.join(", "));
    }
    if !member.recurring.dinner.is_empty() {
        println!("    Dinners:      {}", member.recurring.dinner.join(", "));
    }
}
