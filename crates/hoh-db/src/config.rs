//! Connection settings for the meal-plan database.

/// Environment variable that overrides the configured database URL.
pub const DATABASE_URL_ENV: &str = "HOH_DATABASE_URL";

/// A database URL that cannot be used for `CREATE DATABASE`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DbConfigError {
    #[error("database URL {0:?} does not name a database")]
    MissingName(String),

    #[error("database name {0:?} may only contain ASCII letters, digits and underscores")]
    InvalidName(String),
}

/// Where the plans live and how many connections to hold.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/hoh";

    /// Operator commands issue one query at a time.
    pub const CLI_CONNECTIONS: u32 = 2;

    /// `hoh serve` runs generate and swap requests side by side.
    pub const SERVER_CONNECTIONS: u32 = 10;

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::CLI_CONNECTIONS,
        }
    }

    /// Size the pool for the HTTP server.
    pub fn for_server(mut self) -> Self {
        self.max_connections = Self::SERVER_CONNECTIONS;
        self
    }

    fn split_url(&self) -> (&str, &str, Option<&str>) {
        let (location, query) = match self.database_url.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (self.database_url.as_str(), None),
        };
        match location.rsplit_once('/') {
            Some((server, name)) => (server, name, query),
            None => (location, "", query),
        }
    }

    /// The database name, checked so it can be spliced into
    /// `CREATE DATABASE`.
    pub fn database_name(&self) -> Result<&str, DbConfigError> {
        let (_, name, _) = self.split_url();
        if name.is_empty() {
            return Err(DbConfigError::MissingName(self.database_url.clone()));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DbConfigError::InvalidName(name.to_owned()));
        }
        Ok(name)
    }

    /// The `postgres` maintenance database on the same server, keeping any
    /// connection parameters such as `sslmode`.
    pub fn maintenance_url(&self) -> String {
        match self.split_url() {
            (server, _, Some(query)) => format!("{server}/postgres?{query}"),
            (server, _, None) => format!("{server}/postgres"),
        }
    }
}
