//! Pull request store backed by `SQLite`.
//!
//! Each lifecycle operation runs as a single `BEGIN IMMEDIATE` transaction:
//! the membership snapshot a reviewer decision is based on and the writes
//! that record it commit together or not at all. A cancelled operation rolls
//! back instead of committing.

use chrono::{DateTime, Utc};
use diesel::sqlite::SqliteConnection;
use tokio_util::sync::CancellationToken;

use crate::review::model::{
    MergeOutcome, NewPullRequest, PullRequest, PullRequestStatus, PullRequestWithReviewers,
};
use crate::review::policy::ReviewerSelectionPolicy;

use super::{DatabasePool, StoreError, queries};

/// SQLite-backed store for pull requests and their reviewer edges.
#[derive(Debug, Clone)]
pub struct PullRequestStore {
    pool: DatabasePool,
}

impl PullRequestStore {
    /// Creates a store that checks connections out of `pool`.
    #[must_use]
    pub const fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Creates an `OPEN` pull request and assigns reviewers drawn from the
    /// author's active teammates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] for an unknown author,
    /// [`StoreError::TeamNotFound`] when the author's team record is missing,
    /// [`StoreError::PullRequestAlreadyExists`] for a duplicate id, and
    /// [`StoreError::Cancelled`] once `cancellation` fires. Nothing is written
    /// in any failure case.
    pub fn create_with_reviewers(
        &self,
        request: &NewPullRequest,
        policy: ReviewerSelectionPolicy,
        created_at: DateTime<Utc>,
        cancellation: &CancellationToken,
    ) -> Result<PullRequestWithReviewers, StoreError> {
        self.pool.write_transaction(cancellation, |connection| {
            let author = queries::find_user(connection, &request.author_id)?;
            if !queries::team_exists(connection, &author.team_name)? {
                return Err(StoreError::TeamNotFound);
            }

            let eligible: Vec<String> = queries::team_members(connection, &author.team_name)?
                .into_iter()
                .filter(|member| member.is_active && member.id != author.id)
                .map(|member| member.id)
                .collect();
            let reviewers = policy.select_reviewers(eligible);

            queries::insert_pull_request(connection, request, created_at)?;
            for reviewer_id in &reviewers {
                queries::insert_reviewer(connection, &request.id, reviewer_id)?;
            }

            queries::load_pull_request(connection, &request.id)
        })
    }

    /// Marks a pull request as merged.
    ///
    /// Merging an already merged pull request returns its stored state,
    /// including the original merge time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PullRequestNotFound`] for an unknown id and
    /// [`StoreError::Cancelled`] once `cancellation` fires.
    pub fn merge(
        &self,
        pull_request_id: &str,
        merged_at: DateTime<Utc>,
        cancellation: &CancellationToken,
    ) -> Result<MergeOutcome, StoreError> {
        self.pool.write_transaction(cancellation, |connection| {
            let current = queries::load_pull_request(connection, pull_request_id)?;
            if current.pull_request.status == PullRequestStatus::Merged {
                return Ok(MergeOutcome {
                    state: current,
                    newly_merged: false,
                });
            }

            queries::mark_merged(connection, pull_request_id, merged_at)?;
            Ok(MergeOutcome {
                state: queries::load_pull_request(connection, pull_request_id)?,
                newly_merged: true,
            })
        })
    }

    /// Hands `old_reviewer_id`'s review to another active teammate and
    /// returns the new reviewer's id.
    ///
    /// Candidates are the old reviewer's active teammates other than the old
    /// reviewer and the author. Teammates not yet reviewing the pull request
    /// are preferred. When only a co-reviewer remains, the old edge is dropped
    /// so nobody holds two edges on one pull request.
    ///
    /// # Errors
    ///
    /// Returns, in check order, [`StoreError::PullRequestNotFound`],
    /// [`StoreError::PullRequestMerged`], [`StoreError::UserNotFound`],
    /// [`StoreError::ReviewerNotAssigned`], and
    /// [`StoreError::NoReplacementCandidate`], then [`StoreError::Cancelled`]
    /// once `cancellation` fires. Nothing is written in any failure case.
    pub fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
        policy: ReviewerSelectionPolicy,
        cancellation: &CancellationToken,
    ) -> Result<String, StoreError> {
        self.pool.write_transaction(cancellation, |connection| {
            let current = queries::load_pull_request(connection, pull_request_id)?;
            if current.pull_request.status == PullRequestStatus::Merged {
                return Err(StoreError::PullRequestMerged);
            }

            let old_reviewer = queries::find_user(connection, old_reviewer_id)?;
            if !current
                .assigned_reviewers
                .iter()
                .any(|reviewer| reviewer == &old_reviewer.id)
            {
                return Err(StoreError::ReviewerNotAssigned);
            }

            let candidates: Vec<String> = queries::team_members(connection, &old_reviewer.team_name)?
                .into_iter()
                .filter(|member| {
                    member.is_active
                        && member.id != old_reviewer.id
                        && member.id != current.pull_request.author_id
                })
                .map(|member| member.id)
                .collect();

            let (fresh, co_reviewers): (Vec<String>, Vec<String>) = candidates
                .into_iter()
                .partition(|candidate| !current.assigned_reviewers.contains(candidate));
            let pool = if fresh.is_empty() { co_reviewers } else { fresh };

            let new_reviewer_id = policy
                .pick_replacement(&pool)
                .ok_or(StoreError::NoReplacementCandidate)?;

            swap_edge(connection, &current, &old_reviewer.id, &new_reviewer_id)?;
            Ok(new_reviewer_id)
        })
    }

    /// Lists the pull requests on which `user_id` is a reviewer, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UserNotFound`] when the user does not exist.
    pub fn review_assignments(&self, user_id: &str) -> Result<Vec<PullRequest>, StoreError> {
        self.pool.read_transaction(|connection| {
            queries::find_user(connection, user_id)?;
            queries::pull_requests_reviewed_by(connection, user_id)
        })
    }

    /// Loads a pull request with its reviewers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PullRequestNotFound`] for an unknown id.
    pub fn pull_request(&self, pull_request_id: &str) -> Result<PullRequestWithReviewers, StoreError> {
        self.pool
            .read_transaction(|connection| queries::load_pull_request(connection, pull_request_id))
    }
}

fn swap_edge(
    connection: &mut SqliteConnection,
    current: &PullRequestWithReviewers,
    old_reviewer_id: &str,
    new_reviewer_id: &str,
) -> Result<(), StoreError> {
    let pull_request_id = current.pull_request.id.as_str();
    if current
        .assigned_reviewers
        .iter()
        .any(|reviewer| reviewer == new_reviewer_id)
    {
        queries::remove_reviewer(connection, pull_request_id, old_reviewer_id)
    } else {
        queries::replace_reviewer(connection, pull_request_id, old_reviewer_id, new_reviewer_id)
    }
}
