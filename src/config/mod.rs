//! Server configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.reviewrota.toml` in current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `REVIEWROTA_DATABASE_URL`,
//!    `REVIEWROTA_LISTEN_ADDRESS`, `REVIEWROTA_MAX_CONNECTIONS`
//! 4. **Command-line arguments** – `--database-url`/`-d`,
//!    `--listen-address`/`-l`, and friends
//!
//! # Configuration File
//!
//! ```toml
//! database_url = "reviewrota.sqlite"
//! listen_address = "127.0.0.1:8080"
//! max_connections = 8
//! ```

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::persistence::PersistenceError;

/// Address the server binds to when none is configured.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";

/// Pool size used when none is configured.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Server configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use ortho_config::OrthoConfig;
/// use reviewrota::ReviewRotaConfig;
///
/// let config = ReviewRotaConfig::load().expect("failed to load configuration");
/// config.validate().expect("configuration should be consistent");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "REVIEWROTA",
    discovery(
        dotfile_name = ".reviewrota.toml",
        config_file_name = "reviewrota.toml",
        app_name = "reviewrota"
    )
)]
pub struct ReviewRotaConfig {
    /// `SQLite` database path used for persistence.
    ///
    /// Can be provided via:
    /// - CLI: `--database-url <PATH>` or `-d <PATH>`
    /// - Environment: `REVIEWROTA_DATABASE_URL`
    /// - Config file: `database_url = "..."`
    #[ortho_config(cli_short = 'd')]
    pub database_url: Option<String>,

    /// Runs database migrations and exits without serving requests.
    ///
    /// Can be provided via:
    /// - CLI: `--migrate-db`
    /// - Config file: `migrate_db = true`
    #[ortho_config()]
    pub migrate_db: bool,

    /// Socket address the HTTP server listens on.
    ///
    /// Can be provided via:
    /// - CLI: `--listen-address <ADDR>` or `-l <ADDR>`
    /// - Environment: `REVIEWROTA_LISTEN_ADDRESS`
    /// - Config file: `listen_address = "..."`
    #[ortho_config(cli_short = 'l')]
    pub listen_address: String,

    /// Upper bound on pooled database connections.
    ///
    /// Defaults to 8.
    #[ortho_config()]
    pub max_connections: u32,

    /// Starts serving without applying pending migrations.
    ///
    /// Useful when migrations are run separately with `--migrate-db`.
    #[ortho_config()]
    pub skip_migrations: bool,
}

impl Default for ReviewRotaConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            migrate_db: false,
            listen_address: DEFAULT_LISTEN_ADDRESS.to_owned(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            skip_migrations: false,
        }
    }
}

impl ReviewRotaConfig {
    /// Returns the trimmed database URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] when the URL is missing or blank.
    pub fn require_database_url(&self) -> Result<&str, AppError> {
        let database_url = self
            .database_url
            .as_deref()
            .ok_or_else(|| configuration(&PersistenceError::MissingDatabaseUrl))?;

        let trimmed = database_url.trim();
        if trimmed.is_empty() {
            return Err(configuration(&PersistenceError::BlankDatabaseUrl));
        }
        Ok(trimmed)
    }

    /// Parses the listen address.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] when the address is not a valid
    /// socket address.
    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        self.listen_address
            .trim()
            .parse()
            .map_err(|error| AppError::Configuration {
                message: format!("invalid listen address {:?}: {error}", self.listen_address),
            })
    }

    /// Checks that the configuration can start a server.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] for a missing or blank database
    /// URL, an unparseable listen address, or a zero pool size.
    pub fn validate(&self) -> Result<(), AppError> {
        self.require_database_url()?;
        self.socket_address()?;
        if self.max_connections == 0 {
            return Err(AppError::Configuration {
                message: "max connections must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

fn configuration(error: &PersistenceError) -> AppError {
    AppError::Configuration {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests;
