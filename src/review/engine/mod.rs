//! Lifecycle engine orchestrating teams, pull requests, and reviewers.
//!
//! Each operation maps onto exactly one store transaction. The engine stamps
//! timestamps, owns the reviewer selection policy, translates store outcomes
//! into [`ReviewError`], and reports successful mutations to telemetry.
//! Mutating operations take the caller's [`CancellationToken`] and roll back
//! rather than commit once it fires.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tokio_util::sync::CancellationToken;

use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::error::ReviewError;
use super::model::{
    NewPullRequest, NewTeam, PullRequest, PullRequestWithReviewers, TeamStats, TeamWithMembers,
    User,
};
use super::policy::ReviewerSelectionPolicy;
use super::repository::{PullRequestRepository, TeamRepository};

/// Orchestrates the review lifecycle over a pair of repositories.
pub struct ReviewEngine<Teams, PullRequests> {
    teams: Teams,
    pull_requests: PullRequests,
    policy: ReviewerSelectionPolicy,
    telemetry: Arc<dyn TelemetrySink>,
}

impl<Teams, PullRequests> ReviewEngine<Teams, PullRequests>
where
    Teams: TeamRepository,
    PullRequests: PullRequestRepository,
{
    /// Builds an engine over the given repositories.
    #[must_use]
    pub const fn new(
        teams: Teams,
        pull_requests: PullRequests,
        policy: ReviewerSelectionPolicy,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            teams,
            pull_requests,
            policy,
            telemetry,
        }
    }

    /// Creates a pull request and assigns up to two reviewers.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::UserNotFound`], [`ReviewError::TeamNotFound`],
    /// [`ReviewError::PullRequestAlreadyExists`], or [`ReviewError::Internal`].
    pub fn create_pull_request(
        &self,
        request: &NewPullRequest,
        cancellation: &CancellationToken,
    ) -> Result<PullRequestWithReviewers, ReviewError> {
        let created = self
            .pull_requests
            .create_with_reviewers(request, self.policy, now(), cancellation)
            .map_err(|error| ReviewError::from_store(&error, "create pull request"))?;

        tracing::info!(
            "pull request {} created with reviewers {:?}",
            created.pull_request.id,
            created.assigned_reviewers
        );
        self.telemetry.record(TelemetryEvent::ReviewersAssigned {
            pull_request_id: created.pull_request.id.clone(),
            reviewer_ids: created.assigned_reviewers.clone(),
        });
        Ok(created)
    }

    /// Merges a pull request. Merging twice returns the first merge's state.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::PullRequestNotFound`] or
    /// [`ReviewError::Internal`].
    pub fn merge_pull_request(
        &self,
        pull_request_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<PullRequestWithReviewers, ReviewError> {
        let outcome = self
            .pull_requests
            .merge(pull_request_id, now(), cancellation)
            .map_err(|error| ReviewError::from_store(&error, "merge pull request"))?;

        if outcome.newly_merged {
            tracing::info!("pull request {pull_request_id} merged");
            self.telemetry.record(TelemetryEvent::PullRequestMerged {
                pull_request_id: pull_request_id.to_owned(),
            });
        }
        Ok(outcome.state)
    }

    /// Hands a reviewer's edge to another active teammate and returns the
    /// new reviewer's id.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::PullRequestNotFound`],
    /// [`ReviewError::PullRequestMerged`], [`ReviewError::UserNotFound`],
    /// [`ReviewError::ReviewerNotAssigned`],
    /// [`ReviewError::NoReplacementCandidate`], or [`ReviewError::Internal`].
    pub fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<String, ReviewError> {
        let new_reviewer_id = self
            .pull_requests
            .reassign_reviewer(pull_request_id, old_reviewer_id, self.policy, cancellation)
            .map_err(|error| ReviewError::from_store(&error, "reassign reviewer"))?;

        tracing::info!(
            "pull request {pull_request_id}: reviewer {old_reviewer_id} replaced by {new_reviewer_id}"
        );
        self.telemetry.record(TelemetryEvent::ReviewerReassigned {
            pull_request_id: pull_request_id.to_owned(),
            old_reviewer_id: old_reviewer_id.to_owned(),
            new_reviewer_id: new_reviewer_id.clone(),
        });
        Ok(new_reviewer_id)
    }

    /// Creates a team and upserts its members.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::TeamAlreadyExists`] or [`ReviewError::Internal`].
    pub fn add_team(
        &self,
        team: &NewTeam,
        cancellation: &CancellationToken,
    ) -> Result<TeamWithMembers, ReviewError> {
        let created = self
            .teams
            .upsert_team_and_members(team, cancellation)
            .map_err(|error| ReviewError::from_store(&error, "add team"))?;

        tracing::info!(
            "team {} created with {} member(s)",
            created.team_name,
            created.members.len()
        );
        Ok(created)
    }

    /// Loads a team with its members.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::TeamNotFound`] or [`ReviewError::Internal`].
    pub fn get_team(&self, team_name: &str) -> Result<TeamWithMembers, ReviewError> {
        self.teams
            .team_with_members(team_name)
            .map_err(|error| ReviewError::from_store(&error, "get team"))
    }

    /// Counts a team's users and pull requests.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::TeamNotFound`] or [`ReviewError::Internal`].
    pub fn team_stats(&self, team_name: &str) -> Result<TeamStats, ReviewError> {
        self.teams
            .team_stats(team_name)
            .map_err(|error| ReviewError::from_store(&error, "team stats"))
    }

    /// Sets a user's activity flag.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::UserNotFound`] or [`ReviewError::Internal`].
    pub fn set_user_active(
        &self,
        user_id: &str,
        is_active: bool,
        cancellation: &CancellationToken,
    ) -> Result<User, ReviewError> {
        let user = self
            .teams
            .set_active(user_id, is_active, cancellation)
            .map_err(|error| ReviewError::from_store(&error, "set user activity"))?;

        tracing::info!("user {user_id} is_active set to {is_active}");
        Ok(user)
    }

    /// Lists the pull requests a user is reviewing.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::UserNotFound`] or [`ReviewError::Internal`].
    pub fn review_assignments(&self, user_id: &str) -> Result<Vec<PullRequest>, ReviewError> {
        self.pull_requests
            .review_assignments(user_id)
            .map_err(|error| ReviewError::from_store(&error, "list review assignments"))
    }
}

/// Current time at the millisecond precision the stores persist.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
