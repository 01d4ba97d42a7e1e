mod cleanup_cmd;
mod config;
mod household_cmds;
mod member_cmds;
mod plan_cmds;
mod prefs_cmds;
mod resolve;
mod serve_cmd;

use clap::{Parser, Subcommand};

use hoh_db::pool;

use config::HohConfig;

#[derive(Parser)]
#[command(name = "hoh", about = "Household meal plan generator")]
struct Cli {
    /// Database URL (overrides HOH_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a hoh config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/hoh")]
        db_url: String,
        /// Spoonacular API key
        #[arg(long)]
        api_key: Option<String>,
        /// Recipe service base URL
        #[arg(long, default_value = hoh_core::recipes::spoonacular::DEFAULT_BASE_URL)]
        recipes_url: String,
        /// Timeout for each recipe service call, in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the hoh database (requires config file or env vars)
    DbInit,
    /// Household and user management
    Household {
        #[command(subcommand)]
        command: HouseholdCommands,
    },
    /// Household meal preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },
    /// Family member management
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },
    /// Meal plan generation and slot edits
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Serve the meal plan HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Delete expired meal plans
    Cleanup,
}

#[derive(Subcommand)]
pub enum HouseholdCommands {
    /// Create a household
    Create {
        /// Display name
        name: String,
    },
    /// Link a user to a household (replaces any previous link)
    LinkUser {
        /// Authenticated user identifier
        user_id: String,
        /// Household ID
        household_id: String,
        /// Dietary restriction of the user (repeatable)
        #[arg(long = "restriction")]
        restrictions: Vec<String>,
        /// Allergy of the user (repeatable)
        #[arg(long = "allergy")]
        allergies: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum PrefsCommands {
    /// Show a household's preferences
    Show {
        /// Household ID
        household_id: String,
    },
    /// Update a household's preferences; omitted options keep their value
    Set {
        /// Household ID
        household_id: String,
        /// Suggestion mode: user_only, ai_only or hybrid
        #[arg(long)]
        mode: Option<String>,
        /// Cooking time budget: quick, medium or elaborate
        #[arg(long)]
        cooking_time: Option<String>,
        /// Enabled meal types, comma separated
        #[arg(long, value_delimiter = ',')]
        meal_types: Option<Vec<String>>,
        /// Recurring breakfasts, comma separated
        #[arg(long, value_delimiter = ',')]
        breakfast: Option<Vec<String>>,
        /// Recurring lunches, comma separated
        #[arg(long, value_delimiter = ',')]
        lunch: Option<Vec<String>>,
        /// Recurring dinners, comma separated
        #[arg(long, value_delimiter = ',')]
        dinner: Option<Vec<String>>,
        /// Recurring snacks, comma separated
        #[arg(long, value_delimiter = ',')]
        snacks: Option<Vec<String>>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Add a family member
    Add {
        /// Household ID
        household_id: String,
        /// Member name
        name: String,
        #[arg(long)]
        age: Option<i32>,
        /// Dietary restriction (repeatable)
        #[arg(long = "restriction")]
        restrictions: Vec<String>,
        /// Allergy (repeatable)
        #[arg(long = "allergy")]
        allergies: Vec<String>,
        /// Give the member their own slots instead of sharing adult meals
        #[arg(long)]
        separate: bool,
        /// Recurring dinners for a separate member, comma separated
        #[arg(long, value_delimiter = ',')]
        dinner: Vec<String>,
    },
    /// List a household's members
    List {
        /// Household ID
        household_id: String,
    },
    /// Remove a member
    Remove {
        /// Household ID
        household_id: String,
        /// Member ID
        member_id: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Generate (or regenerate) the plan for a week
    Generate {
        /// Acting user
        #[arg(long)]
        user: String,
        /// First day of the week (YYYY-MM-DD)
        start_date: String,
    },
    /// Show a week's plan, or the current plan when no date is given
    Show {
        #[arg(long)]
        user: String,
        /// First day of the week (YYYY-MM-DD)
        start_date: Option<String>,
        /// Print the plan document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace one slot with a different meal
    Swap {
        #[arg(long)]
        user: String,
        /// First day of the plan's week (YYYY-MM-DD)
        start_date: String,
        /// Slot date (YYYY-MM-DD)
        date: String,
        /// Slot meal type
        meal_type: String,
        /// Address a member's own slot instead of the shared one
        #[arg(long)]
        member: Option<String>,
    },
    /// Overwrite one slot with a custom meal name
    SetCustom {
        #[arg(long)]
        user: String,
        start_date: String,
        date: String,
        meal_type: String,
        /// Meal name
        name: String,
        #[arg(long)]
        member: Option<String>,
    },
}

/// Execute the `hoh init` command: write config file.
fn cmd_init(
    db_url: &str,
    api_key: Option<String>,
    recipes_url: String,
    timeout_secs: u64,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if timeout_secs == 0 {
        anyhow::bail!("--timeout-secs must be greater than zero");
    }

    let has_key = api_key.is_some();
    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        recipes: config::RecipesSection {
            api_key: api_key.unwrap_or_default(),
            base_url: recipes_url,
            timeout_secs,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  recipes.base_url = {}", cfg.recipes.base_url);
    if !has_key {
        println!("  recipes.api_key is empty; set {} before generating plans", config::API_KEY_ENV);
    }
    println!();
    println!("Next: run `hoh db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `hoh db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = HohConfig::resolve(cli_db_url)?;

    println!("Initializing hoh database...");

    if pool::create_database_if_missing(&resolved.db_config).await? {
        println!("Created database {}.", resolved.db_config.database_name()?);
    }
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let summary = pool::schema_summary(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &summary.tables {
        println!("  {table:<22} {count} rows");
    }
    if summary.expired_plans > 0 {
        println!(
            "  {} expired plan(s); run `hoh cleanup` to remove them.",
            summary.expired_plans
        );
    }

    db_pool.close().await;

    println!("hoh db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            recipes_url,
            timeout_secs,
            force,
        } => {
            cmd_init(&db_url, api_key, recipes_url, timeout_secs, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Household { command } => {
            let resolved = HohConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = household_cmds::run_household_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Prefs { command } => {
            let resolved = HohConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = prefs_cmds::run_prefs_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Member { command } => {
            let resolved = HohConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = member_cmds::run_member_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Plan { command } => {
            let resolved = HohConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &resolved, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Serve { bind, port } => {
            let resolved = HohConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config.clone().for_server()).await?;
            let result = match resolved.build_service(db_pool.clone()) {
                Ok(service) => serve_cmd::run_serve(service, &bind, port).await,
                Err(e) => Err(e),
            };
            db_pool.close().await;
            result?;
        }
        Commands::Cleanup => {
            let resolved = HohConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = cleanup_cmd::run_cleanup(&db_pool).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test_util {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Serialize tests that mutate process environment variables.
    pub fn lock_env() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
