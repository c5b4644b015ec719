//! Team membership store backed by `SQLite`.
//!
//! Teams are created once together with their initial members. Users are
//! upserted: adding a team that names an existing user moves that user onto
//! the new team and overwrites their username and activity flag.

use tokio_util::sync::CancellationToken;

use crate::review::model::{NewTeam, TeamStats, TeamWithMembers, User};

use super::{DatabasePool, PersistenceError, StoreError, queries};

/// SQLite-backed store for teams and their users.
#[derive(Debug, Clone)]
pub struct TeamStore {
    pool: DatabasePool,
}

impl TeamStore {
    /// Creates a store that checks connections out of `pool`.
    #[must_use]
    pub const fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Returns whether a team called `team_name` exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the lookup fails.
    pub fn team_exists(&self, team_name: &str) -> Result<bool, StoreError> {
        self.pool
            .read_transaction(|connection| queries::team_exists(connection, team_name))
    }

    /// Returns every user currently tagged with `team_name`.
    ///
    /// An unknown team simply has no members.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the lookup fails.
    pub fn members_of(&self, team_name: &str) -> Result<Vec<User>, StoreError> {
        self.pool
            .read_transaction(|connection| queries::team_members(connection, team_name))
    }

    /// Loads a team together with its members.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TeamNotFound`] when the team does not exist.
    pub fn team_with_members(&self, team_name: &str) -> Result<TeamWithMembers, StoreError> {
        self.pool.read_transaction(|connection| {
            if !queries::team_exists(connection, team_name)? {
                return Err(StoreError::TeamNotFound);
            }
            let members = queries::team_members(connection, team_name)?;
            Ok(TeamWithMembers {
                team_name: team_name.to_owned(),
                members,
            })
        })
    }

    /// Creates `team` and upserts each of its members in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TeamAlreadyExists`] when the name is taken and
    /// [`StoreError::Cancelled`] once `cancellation` fires. No member is
    /// touched in either case.
    pub fn upsert_team_and_members(
        &self,
        team: &NewTeam,
        cancellation: &CancellationToken,
    ) -> Result<TeamWithMembers, StoreError> {
        self.pool.write_transaction(cancellation, |connection| {
            queries::insert_team(connection, &team.team_name)?;
            for member in &team.members {
                let user = member.clone().into_user(&team.team_name);
                queries::upsert_user(connection, &user)?;
            }
            let members = queries::team_members(connection, &team.team_name)?;
            Ok(TeamWithMembers {
                team_name: team.team_name.clone(),
                members,
            })
        })
    }

    /// Loads a single user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] when no such user exists.
    pub fn user_by_id(&self, user_id: &str) -> Result<User, StoreError> {
        self.pool
            .read_transaction(|connection| queries::find_user(connection, user_id))
    }

    /// Updates a user's activity flag and returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] when no such user exists and
    /// [`StoreError::Cancelled`] once `cancellation` fires.
    pub fn set_active(
        &self,
        user_id: &str,
        is_active: bool,
        cancellation: &CancellationToken,
    ) -> Result<User, StoreError> {
        self.pool.write_transaction(cancellation, |connection| {
            queries::set_user_active(connection, user_id, is_active)?;
            queries::find_user(connection, user_id)
        })
    }

    /// Counts a team's users by activity and its members' pull requests by
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TeamNotFound`] when the team does not exist.
    pub fn team_stats(&self, team_name: &str) -> Result<TeamStats, StoreError> {
        let counts = self.pool.read_transaction(|connection| {
            if !queries::team_exists(connection, team_name)? {
                return Err(StoreError::TeamNotFound);
            }
            queries::team_counts(connection, team_name)
        })?;

        Ok(TeamStats {
            team_name: team_name.to_owned(),
            active_users: count_to_u64(counts.active_users)?,
            inactive_users: count_to_u64(counts.inactive_users)?,
            open_pull_requests: count_to_u64(counts.open_pull_requests)?,
            merged_pull_requests: count_to_u64(counts.merged_pull_requests)?,
        })
    }
}

fn count_to_u64(count: i64) -> Result<u64, PersistenceError> {
    u64::try_from(count).map_err(|_| PersistenceError::CorruptRow {
        message: format!("negative row count {count}"),
    })
}
