//! Fixtures shared by the store tests.

use rstest::fixture;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::review::model::{NewTeam, TeamMember};
use crate::telemetry::NoopTelemetrySink;

use super::{DatabasePool, TeamStore};

pub(crate) type FixtureResult<T> = Result<T, Box<dyn std::error::Error>>;

/// A migrated database file plus a pool over it. The directory must outlive
/// the pool.
pub(crate) struct MigratedDatabase {
    pub(crate) _temp_dir: TempDir,
    pub(crate) database_url: String,
    pub(crate) pool: DatabasePool,
}

#[fixture]
pub(crate) fn migrated_database() -> FixtureResult<MigratedDatabase> {
    let temp_dir = TempDir::new()?;
    let database_url = temp_dir
        .path()
        .join("reviewrota.sqlite")
        .to_string_lossy()
        .to_string();
    let pool = DatabasePool::connect(&database_url, 4)?;
    pool.run_migrations(&NoopTelemetrySink)?;

    Ok(MigratedDatabase {
        _temp_dir: temp_dir,
        database_url,
        pool,
    })
}

pub(crate) fn member(id: &str, is_active: bool) -> TeamMember {
    TeamMember {
        id: id.to_owned(),
        username: format!("{id}-name"),
        is_active,
    }
}

/// Creates `team_name` with `(id, is_active)` members.
pub(crate) fn seed_team(
    pool: &DatabasePool,
    team_name: &str,
    members: &[(&str, bool)],
) -> FixtureResult<()> {
    TeamStore::new(pool.clone()).upsert_team_and_members(
        &NewTeam {
            team_name: team_name.to_owned(),
            members: members
                .iter()
                .map(|(id, is_active)| member(id, *is_active))
                .collect(),
        },
        &CancellationToken::new(),
    )?;
    Ok(())
}
