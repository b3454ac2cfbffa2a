//! Storage configuration.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteConnectOptions;

use crate::error::{Result, StorageError};

/// Default database location, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:database.db";

/// How to open the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite URL (`sqlite:path`, `sqlite://path`, `sqlite::memory:`).
    pub database_url: String,
    /// Create the file if it does not exist.
    pub create_if_missing: bool,
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Enforce foreign key constraints.
    pub foreign_keys: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            create_if_missing: true,
            busy_timeout_ms: 5000,
            foreign_keys: true,
        }
    }
}

impl StorageConfig {
    /// A private in-memory database. Contents vanish on disconnect.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default().with_database_url("sqlite::memory:")
    }

    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StorageError::Config(format!("cannot read {}: {e}", path.display())))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sets the database URL.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Sets whether a missing file is created.
    #[must_use]
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets the busy timeout.
    #[must_use]
    pub fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }

    /// Sets foreign key enforcement.
    #[must_use]
    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Builds driver connect options.
    pub fn connect_options(&self) -> Result<SqliteConnectOptions> {
        if self.database_url.contains("://") && !self.database_url.starts_with("sqlite:") {
            return Err(StorageError::Config(format!(
                "not a SQLite URL: '{}'",
                self.database_url
            )));
        }

        let options = SqliteConnectOptions::from_str(&self.database_url).map_err(|e| {
            StorageError::Config(format!("invalid database URL '{}': {e}", self.database_url))
        })?;

        Ok(options
            .create_if_missing(self.create_if_missing)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
            .foreign_keys(self.foreign_keys))
    }
}
