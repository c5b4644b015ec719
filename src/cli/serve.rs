//! HTTP server start-up and shutdown.

use std::sync::Arc;

use reviewrota::telemetry::{StderrJsonlTelemetrySink, TelemetrySink};
use reviewrota::{
    AppError, BlockingReviewService, DatabasePool, PullRequestStore, ReviewEngine,
    ReviewRotaConfig, ReviewerSelectionPolicy, TeamStore, router,
};
use tokio::net::TcpListener;

/// Opens the database, applies migrations unless skipped, and serves the
/// API until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns [`AppError::Configuration`] for unusable settings,
/// [`AppError::Persistence`] when the database cannot be prepared, and
/// [`AppError::Io`] when the listener cannot be bound or serving fails.
pub async fn run(config: &ReviewRotaConfig) -> Result<(), AppError> {
    config.validate()?;
    let database_url = config.require_database_url()?;
    let address = config.socket_address()?;

    let telemetry: Arc<dyn TelemetrySink> = Arc::new(StderrJsonlTelemetrySink);
    let pool = DatabasePool::connect(database_url, config.max_connections)?;
    if config.skip_migrations {
        tracing::info!("skipping database migrations");
    } else {
        let schema_version = pool.run_migrations(telemetry.as_ref())?;
        tracing::info!(
            "database schema is at version {}",
            schema_version.as_str()
        );
    }

    let engine = ReviewEngine::new(
        TeamStore::new(pool.clone()),
        PullRequestStore::new(pool),
        ReviewerSelectionPolicy::Random,
        telemetry,
    );
    let app = router(Arc::new(BlockingReviewService::new(engine)));

    let listener = TcpListener::bind(address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
