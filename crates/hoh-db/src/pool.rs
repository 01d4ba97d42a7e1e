//! Pool construction and schema setup.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/hoh-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tables created by the migrations, parents before children.
pub const SCHEMA_TABLES: [&str; 5] = [
    "households",
    "user_profiles",
    "household_preferences",
    "family_members",
    "meal_plans",
];

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!(migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}

/// Create the configured database through the server's maintenance
/// database. Returns `true` when it had to be created.
pub async fn create_database_if_missing(config: &DbConfig) -> Result<bool> {
    let db_name = config.database_name()?;
    let maintenance_url = config.maintenance_url();

    let maint = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&maintenance_url)
        .await
        .with_context(|| format!("failed to connect to maintenance database at {maintenance_url}"))?;

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint)
            .await
            .context("failed to query pg_database")?;

    if !exists {
        // `database_name` only admits [A-Za-z0-9_].
        maint
            .execute(format!("CREATE DATABASE {db_name}").as_str())
            .await
            .with_context(|| format!("failed to create database {db_name}"))?;
        info!(db = db_name, "database created");
    }

    maint.close().await;
    Ok(!exists)
}

/// What `hoh db-init` reports once the schema is in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSummary {
    /// Row count per table, in [`SCHEMA_TABLES`] order.
    pub tables: Vec<(&'static str, i64)>,
    /// Plans past retention that `hoh cleanup` would remove.
    pub expired_plans: i64,
}

pub async fn schema_summary(pool: &PgPool) -> Result<SchemaSummary> {
    let (households, profiles, preferences, members, plans, expired): (
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        "SELECT \
           (SELECT COUNT(*) FROM households), \
           (SELECT COUNT(*) FROM user_profiles), \
           (SELECT COUNT(*) FROM household_preferences), \
           (SELECT COUNT(*) FROM family_members), \
           (SELECT COUNT(*) FROM meal_plans), \
           (SELECT COUNT(*) FROM meal_plans WHERE expires_at <= now())",
    )
    .fetch_one(pool)
    .await
    .context("failed to count schema rows")?;

    let counts = [households, profiles, preferences, members, plans];
    Ok(SchemaSummary {
        tables: SCHEMA_TABLES.into_iter().zip(counts).collect(),
        expired_plans: expired,
    })
}
