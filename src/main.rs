//! `reviewrota` entrypoint: migrates the database or serves the review API.

mod cli;

use std::io::{self, Write};
use std::process::ExitCode;

use ortho_config::OrthoConfig;
use reviewrota::{AppError, ReviewRotaConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "reviewrota=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = load_config()?;

    if config.migrate_db {
        return cli::migrations::run(&config);
    }

    cli::serve::run(&config).await
}

/// Installs a stderr subscriber filtered by `RUST_LOG`.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<ReviewRotaConfig, AppError> {
    ReviewRotaConfig::load().map_err(|error| AppError::Configuration {
        message: error.to_string(),
    })
}
