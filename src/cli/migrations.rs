//! Database migration operations.

use reviewrota::persistence::{PersistenceError, migrate_database};
use reviewrota::telemetry::StderrJsonlTelemetrySink;
use reviewrota::{AppError, ReviewRotaConfig};

/// Runs database migrations against the configured database.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] if the database URL is missing or blank.
/// Returns [`AppError::Persistence`] for connection or migration failures.
pub fn run(config: &ReviewRotaConfig) -> Result<(), AppError> {
    let database_url = config.require_database_url()?;

    let telemetry = StderrJsonlTelemetrySink;
    let schema_version =
        migrate_database(database_url, &telemetry).map_err(|error| map_persistence_error(&error))?;

    tracing::info!(
        "database schema is at version {}",
        schema_version.as_str()
    );
    Ok(())
}

/// Splits configuration problems from runtime persistence failures.
fn map_persistence_error(error: &PersistenceError) -> AppError {
    if matches!(error, PersistenceError::BlankDatabaseUrl) {
        AppError::Configuration {
            message: error.to_string(),
        }
    } else {
        AppError::Persistence(error.clone())
    }
}
