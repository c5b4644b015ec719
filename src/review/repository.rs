//! Storage seams used by the lifecycle engine.
//!
//! The engine only talks to these traits, so unit tests can swap the Diesel
//! stores for `mockall` mocks. Every write takes the caller's
//! [`CancellationToken`]; a write whose token has fired rolls back instead of
//! committing.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::persistence::{PullRequestStore, StoreError, TeamStore};

use super::model::{
    MergeOutcome, NewPullRequest, NewTeam, PullRequest, PullRequestWithReviewers, TeamStats,
    TeamWithMembers, User,
};
use super::policy::ReviewerSelectionPolicy;

/// Team and membership storage.
#[cfg_attr(test, mockall::automock)]
pub trait TeamRepository: Send + Sync {
    /// Creates a team and upserts its members atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TeamAlreadyExists`] when the name is taken.
    fn upsert_team_and_members(
        &self,
        team: &NewTeam,
        cancellation: &CancellationToken,
    ) -> Result<TeamWithMembers, StoreError>;

    /// Loads a team with its members.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TeamNotFound`] for an unknown team.
    fn team_with_members(&self, team_name: &str) -> Result<TeamWithMembers, StoreError>;

    /// Updates a user's activity flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unknown user.
    fn set_active(
        &self,
        user_id: &str,
        is_active: bool,
        cancellation: &CancellationToken,
    ) -> Result<User, StoreError>;

    /// Counts a team's users and pull requests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TeamNotFound`] for an unknown team.
    fn team_stats(&self, team_name: &str) -> Result<TeamStats, StoreError>;
}

/// Pull request and reviewer edge storage.
#[cfg_attr(test, mockall::automock)]
pub trait PullRequestRepository: Send + Sync {
    /// Creates a pull request and its reviewer edges atomically.
    ///
    /// # Errors
    ///
    /// Returns the store outcome that prevented creation.
    fn create_with_reviewers(
        &self,
        request: &NewPullRequest,
        policy: ReviewerSelectionPolicy,
        created_at: DateTime<Utc>,
        cancellation: &CancellationToken,
    ) -> Result<PullRequestWithReviewers, StoreError>;

    /// Merges a pull request; an already merged one is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PullRequestNotFound`] for an unknown id.
    fn merge(
        &self,
        pull_request_id: &str,
        merged_at: DateTime<Utc>,
        cancellation: &CancellationToken,
    ) -> Result<MergeOutcome, StoreError>;

    /// Replaces one reviewer edge and returns the new reviewer's id.
    ///
    /// # Errors
    ///
    /// Returns the store outcome that prevented the reassignment.
    fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
        policy: ReviewerSelectionPolicy,
        cancellation: &CancellationToken,
    ) -> Result<String, StoreError>;

    /// Lists the pull requests a user reviews.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unknown user.
    fn review_assignments(&self, user_id: &str) -> Result<Vec<PullRequest>, StoreError>;
}

impl TeamRepository for TeamStore {
    fn upsert_team_and_members(
        &self,
        team: &NewTeam,
        cancellation: &CancellationToken,
    ) -> Result<TeamWithMembers, StoreError> {
        Self::upsert_team_and_members(self, team, cancellation)
    }

    fn team_with_members(&self, team_name: &str) -> Result<TeamWithMembers, StoreError> {
        Self::team_with_members(self, team_name)
    }

    fn set_active(
        &self,
        user_id: &str,
        is_active: bool,
        cancellation: &CancellationToken,
    ) -> Result<User, StoreError> {
        Self::set_active(self, user_id, is_active, cancellation)
    }

    fn team_stats(&self, team_name: &str) -> Result<TeamStats, StoreError> {
        Self::team_stats(self, team_name)
    }
}

impl PullRequestRepository for PullRequestStore {
    fn create_with_reviewers(
        &self,
        request: &NewPullRequest,
        policy: ReviewerSelectionPolicy,
        created_at: DateTime<Utc>,
        cancellation: &CancellationToken,
    ) -> Result<PullRequestWithReviewers, StoreError> {
        Self::create_with_reviewers(self, request, policy, created_at, cancellation)
    }

    fn merge(
        &self,
        pull_request_id: &str,
        merged_at: DateTime<Utc>,
        cancellation: &CancellationToken,
    ) -> Result<MergeOutcome, StoreError> {
        Self::merge(self, pull_request_id, merged_at, cancellation)
    }

    fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
        policy: ReviewerSelectionPolicy,
        cancellation: &CancellationToken,
    ) -> Result<String, StoreError> {
        Self::reassign_reviewer(self, pull_request_id, old_reviewer_id, policy, cancellation)
    }

    fn review_assignments(&self, user_id: &str) -> Result<Vec<PullRequest>, StoreError> {
        Self::review_assignments(self, user_id)
    }
}
