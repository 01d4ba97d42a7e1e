//! Configuration file management for hoh.
//!
//! Provides a TOML-based config file at `~/.config/hoh/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use hoh_core::recipes::SpoonacularClient;
use hoh_core::recipes::spoonacular::DEFAULT_BASE_URL;
use hoh_core::store::PgStore;
use hoh_core::{EngineConfig, MealPlanService};
use hoh_db::config::{DATABASE_URL_ENV, DbConfig};

pub const API_KEY_ENV: &str = "HOH_RECIPES_API_KEY";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub recipes: RecipesSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipesSection {
    /// Spoonacular API key. Empty means "not configured".
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RecipesSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: EngineConfig::DEFAULT_UPSTREAM_TIMEOUT.as_secs(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the hoh config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/hoh` or `~/.config/hoh`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("hoh");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("hoh")
}

/// Return the path to the hoh config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Recipe service settings after resolution.
#[derive(Debug, Clone)]
pub struct RecipeSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct HohConfig {
    pub db_config: DbConfig,
    pub recipes: RecipeSettings,
}

impl HohConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `HOH_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - API key: `HOH_RECIPES_API_KEY` env > `config_file.recipes.api_key` > unset
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        let section = file_config.map(|cfg| cfg.recipes).unwrap_or_default();
        let non_empty = |key: &String| !key.trim().is_empty();
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(non_empty)
            .or(Some(section.api_key).filter(non_empty));
        if section.timeout_secs == 0 {
            bail!("recipes.timeout_secs must be greater than zero");
        }

        Ok(Self {
            db_config,
            recipes: RecipeSettings {
                api_key,
                base_url: section.base_url,
                timeout: Duration::from_secs(section.timeout_secs),
            },
        })
    }

    /// Engine limits with the configured upstream timeout applied.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_upstream_timeout(self.recipes.timeout)
    }

    /// Build the Spoonacular client. Fails when no API key is configured.
    pub fn recipe_client(&self) -> Result<SpoonacularClient> {
        let Some(api_key) = self.recipes.api_key.as_deref() else {
            bail!(
                "recipe API key not found; set {API_KEY_ENV} or run `hoh init --api-key <KEY>`"
            );
        };
        let client =
            SpoonacularClient::new(&self.recipes.base_url, api_key, self.recipes.timeout)?;
        Ok(client)
    }

    /// Wire the Postgres stores and the recipe client into a service.
    pub fn build_service(&self, pool: PgPool) -> Result<MealPlanService> {
        let store = Arc::new(PgStore::new(pool));
        let recipes = Arc::new(self.recipe_client()?);
        Ok(MealPlanService::new(
            store.clone(),
            store,
            recipes,
            self.engine_config(),
        ))
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point config lookup at an empty temp dir for the duration of `f`.
    fn with_isolated_config<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let out = f(tmp.path());

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        out
    }

    #[test]
    fn missing_recipes_section_uses_defaults() {
        let parsed: ConfigFile =
            toml::from_str("[database]\nurl = \"postgresql://h:5432/db\"\n").unwrap();
        assert_eq!(parsed.database.url, "postgresql://h:5432/db");
        assert!(parsed.recipes.api_key.is_empty());
        assert_eq!(parsed.recipes.base_url, DEFAULT_BASE_URL);
        assert_eq!(parsed.recipes.timeout_secs, 30);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_writes_owner_only_file() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        with_isolated_config(|dir| {
            let cfg = ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://testhost:5432/testdb".to_string(),
                },
                recipes: RecipesSection {
                    api_key: "k-123".to_string(),
                    ..Default::default()
                },
            };
            save_config(&cfg).unwrap();

            let path = dir.join("hoh").join("config.toml");
            let meta = std::fs::metadata(&path).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);

            let loaded = load_config().unwrap();
            assert_eq!(loaded.database.url, cfg.database.url);
            assert_eq!(loaded.recipes.api_key, "k-123");
        });
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        unsafe { std::env::set_var("HOH_DATABASE_URL", "postgresql://env:5432/envdb") };

        let config = HohConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        unsafe { std::env::remove_var("HOH_DATABASE_URL") };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        with_isolated_config(|_| {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://file:5432/filedb".to_string(),
                },
                recipes: RecipesSection {
                    api_key: "from-file".to_string(),
                    ..Default::default()
                },
            })
            .unwrap();

            let config = HohConfig::resolve(None).unwrap();
            assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
            assert_eq!(config.recipes.api_key.as_deref(), Some("from-file"));

            unsafe { std::env::set_var("HOH_DATABASE_URL", "postgresql://env:5432/envdb") };
            unsafe { std::env::set_var(API_KEY_ENV, "from-env") };
            let config = HohConfig::resolve(None).unwrap();
            unsafe { std::env::remove_var("HOH_DATABASE_URL") };
            unsafe { std::env::remove_var(API_KEY_ENV) };

            assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
            assert_eq!(config.recipes.api_key.as_deref(), Some("from-env"));
        });
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        unsafe { std::env::remove_var("HOH_DATABASE_URL") };
        unsafe { std::env::remove_var(API_KEY_ENV) };

        with_isolated_config(|_| {
            let config = HohConfig::resolve(None).unwrap();
            assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
            assert!(config.recipes.api_key.is_none());
            assert_eq!(config.recipes.base_url, DEFAULT_BASE_URL);
            assert_eq!(config.engine_config().upstream_timeout, Duration::from_secs(30));

            let err = config.recipe_client().err().expect("client needs a key");
            assert!(
                err.to_string().contains("recipe API key not found"),
                "unexpected error: {err}"
            );
        });
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("hoh/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
