//! Shared test utilities.

use std::sync::Arc;

use reviewrota::persistence::{DatabasePool, PullRequestStore, TeamStore};
use reviewrota::review::{NewTeam, ReviewEngine, ReviewerSelectionPolicy, TeamMember};
use reviewrota::telemetry::{NoopTelemetrySink, TelemetrySink};
use tempfile::TempDir;

/// Engine wired to the `SQLite` stores.
pub type StoreEngine = ReviewEngine<TeamStore, PullRequestStore>;

/// Creates a temporary directory for database tests.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
pub fn create_temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"))
}

/// Path of the database file inside `temp_dir`.
pub fn database_path(temp_dir: &TempDir) -> String {
    temp_dir
        .path()
        .join("reviewrota.sqlite")
        .to_string_lossy()
        .into_owned()
}

/// Opens a pool on `database_url` and applies migrations.
///
/// # Panics
///
/// Panics if the pool cannot be built or migrations fail.
pub fn migrated_pool(database_url: &str, max_connections: u32) -> DatabasePool {
    let pool = DatabasePool::connect(database_url, max_connections)
        .unwrap_or_else(|error| panic!("pool should open: {error}"));
    pool.run_migrations(&NoopTelemetrySink)
        .unwrap_or_else(|error| panic!("migrations should run: {error}"));
    pool
}

/// Builds a randomly selecting engine over `pool`.
pub fn store_engine(pool: &DatabasePool, telemetry: Arc<dyn TelemetrySink>) -> StoreEngine {
    ReviewEngine::new(
        TeamStore::new(pool.clone()),
        PullRequestStore::new(pool.clone()),
        ReviewerSelectionPolicy::Random,
        telemetry,
    )
}

/// Team creation request whose members use their id as username.
pub fn new_team(team_name: &str, members: &[(&str, bool)]) -> NewTeam {
    NewTeam {
        team_name: team_name.to_owned(),
        members: members
            .iter()
            .map(|(id, is_active)| TeamMember {
                id: (*id).to_owned(),
                username: format!("user-{id}"),
                is_active: *is_active,
            })
            .collect(),
    }
}
