//! Domain types shared by the stores, the engine, and the HTTP layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of reviewers attached to a pull request.
pub const MAX_REVIEWERS: usize = 2;

/// A user tagged with a team and an activity flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Name of the team the user currently belongs to.
    pub team_name: String,
    /// Whether the user may be picked as a reviewer.
    pub is_active: bool,
}

/// Member payload supplied when a team is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Unique user identifier.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Whether the user may be picked as a reviewer.
    pub is_active: bool,
}

impl TeamMember {
    /// Tags the member with `team_name`, producing the stored user record.
    #[must_use]
    pub fn into_user(self, team_name: &str) -> User {
        User {
            id: self.id,
            username: self.username,
            team_name: team_name.to_owned(),
            is_active: self.is_active,
        }
    }
}

/// A team creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    /// Unique team name.
    pub team_name: String,
    /// Members to upsert under the new team.
    pub members: Vec<TeamMember>,
}

/// A team together with the users currently tagged with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamWithMembers {
    /// Unique team name.
    pub team_name: String,
    /// Users whose team tag matches `team_name`.
    pub members: Vec<User>,
}

/// Membership and pull request counters for a single team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    /// Team the counters belong to.
    pub team_name: String,
    /// Active users tagged with the team.
    pub active_users: u64,
    /// Inactive users tagged with the team.
    pub inactive_users: u64,
    /// Open pull requests authored by team members.
    pub open_pull_requests: u64,
    /// Merged pull requests authored by team members.
    pub merged_pull_requests: u64,
}

/// Lifecycle state of a pull request. `Open` may only move to `Merged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestStatus {
    /// Reviewers may still change.
    Open,
    /// Terminal state.
    Merged,
}

impl PullRequestStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a persisted status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pull request status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for PullRequestStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// A pull request record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Unique pull request identifier.
    pub id: String,
    /// Human readable title.
    pub name: String,
    /// Identifier of the authoring user.
    pub author_id: String,
    /// Current lifecycle state.
    pub status: PullRequestStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Merge time; set exactly once when the PR is merged.
    pub merged_at: Option<DateTime<Utc>>,
}

/// A pull request with its current reviewer edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestWithReviewers {
    /// The pull request record.
    pub pull_request: PullRequest,
    /// Reviewer identifiers in assignment order.
    pub assigned_reviewers: Vec<String>,
}

/// Outcome of a merge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Pull request state after the call.
    pub state: PullRequestWithReviewers,
    /// False when the pull request had already been merged.
    pub newly_merged: bool,
}

/// A pull request creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    /// Unique pull request identifier.
    pub id: String,
    /// Human readable title.
    pub name: String,
    /// Identifier of the authoring user.
    pub author_id: String,
}
