//! Shared test utilities for hoh integration tests.
//!
//! Provides a PostgreSQL server shared across tests (each test gets its own
//! database on it) and in-memory fakes of the engine's store and recipe
//! source contracts in [`fakes`].
//!
//! The server comes from one of two places:
//! - **`HOH_TEST_PG_URL`** set: use that server directly.
//! - **No env var**: start a container via testcontainers, shared per test
//!   binary through a `OnceCell`.

pub mod fakes;

use sqlx::{Executor, PgPool};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use hoh_db::config::DbConfig;
use hoh_db::pool;

struct SharedServer {
    /// Server root URL, without a database name.
    root_url: String,
    /// Keeps the container alive. `None` for an external server.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_SERVER: OnceCell<SharedServer> = OnceCell::const_new();

async fn start_server() -> SharedServer {
    if let Ok(url) = std::env::var("HOH_TEST_PG_URL") {
        return SharedServer {
            root_url: url.trim_end_matches('/').to_string(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("17")
        .start()
        .await
        .expect("failed to start PostgreSQL container");
    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedServer {
        root_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Root URL of the shared server (no database name appended).
pub async fn pg_url() -> &'static str {
    &SHARED_SERVER.get_or_init(start_server).await.root_url
}

/// Create a uniquely-named database with migrations applied.
///
/// Returns `(pool, db_name)`; pass `db_name` to [`drop_test_db`] when done.
pub async fn create_test_db() -> (PgPool, String) {
    let db_name = format!("hoh_test_{}", Uuid::new_v4().simple());
    let config = DbConfig::new(format!("{}/{db_name}", pg_url().await));

    pool::create_database_if_missing(&config)
        .await
        .unwrap_or_else(|e| panic!("failed to create {db_name}: {e:#}"));
    let pool = pool::create_pool(&config)
        .await
        .unwrap_or_else(|e| panic!("failed to connect to {db_name}: {e:#}"));
    pool::run_migrations(&pool)
        .await
        .expect("migrations should succeed");

    (pool, db_name)
}

/// Drop a database created by [`create_test_db`], terminating any
/// remaining connections first. Errors are ignored.
pub async fn drop_test_db(db_name: &str) {
    let config = DbConfig::new(format!("{}/{db_name}", pg_url().await));
    let Ok(maint) = PgPool::connect(&config.maintenance_url()).await else {
        return;
    };

    let terminate = format!(
        "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
         WHERE datname = '{db_name}' AND pid <> pg_backend_pid()"
    );
    let _ = maint.execute(terminate.as_str()).await;
    let _ = maint
        .execute(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .await;
    maint.close().await;
}
