//! JSON request and response bodies.
//!
//! Field names follow the public wire format (`pull_request_id`,
//! `old_user_id`, `mergedAt`, ...), which differs from the domain names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::{
    NewPullRequest, NewTeam, PullRequest, PullRequestStatus, PullRequestWithReviewers, TeamMember,
    TeamStats, TeamWithMembers, User,
};

#[derive(Debug, Serialize)]
pub(crate) struct PingResponse {
    pub(crate) message: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) code: &'static str,
    pub(crate) message: String,
}

// ── Teams ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct TeamMemberBody {
    user_id: String,
    username: String,
    is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddTeamRequest {
    pub(crate) team_name: String,
    pub(crate) members: Vec<TeamMemberBody>,
}

impl AddTeamRequest {
    /// Identifiers that must not be blank, labelled for error messages.
    pub(crate) fn identifiers(&self) -> impl Iterator<Item = (&'static str, &str)> {
        std::iter::once(("team_name", self.team_name.as_str())).chain(
            self.members
                .iter()
                .map(|member| ("user_id", member.user_id.as_str())),
        )
    }

    pub(crate) fn into_new_team(self) -> NewTeam {
        NewTeam {
            team_name: self.team_name,
            members: self
                .members
                .into_iter()
                .map(|member| TeamMember {
                    id: member.user_id,
                    username: member.username,
                    is_active: member.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamQuery {
    pub(crate) team_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeamResponse {
    team_name: String,
    members: Vec<TeamMemberBody>,
}

impl From<TeamWithMembers> for TeamResponse {
    fn from(team: TeamWithMembers) -> Self {
        Self {
            team_name: team.team_name,
            members: team
                .members
                .into_iter()
                .map(|user| TeamMemberBody {
                    user_id: user.id,
                    username: user.username,
                    is_active: user.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TeamStatsResponse {
    team_name: String,
    active_users: u64,
    inactive_users: u64,
    open_prs: u64,
    merged_prs: u64,
}

impl From<TeamStats> for TeamStatsResponse {
    fn from(stats: TeamStats) -> Self {
        Self {
            team_name: stats.team_name,
            active_users: stats.active_users,
            inactive_users: stats.inactive_users,
            open_prs: stats.open_pull_requests,
            merged_prs: stats.merged_pull_requests,
        }
    }
}

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct SetIsActiveRequest {
    pub(crate) user_id: String,
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserQuery {
    pub(crate) user_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserEnvelope {
    user: UserBody,
}

#[derive(Debug, Serialize)]
struct UserBody {
    user_id: String,
    username: String,
    team_name: String,
    is_active: bool,
}

impl From<User> for UserEnvelope {
    fn from(user: User) -> Self {
        Self {
            user: UserBody {
                user_id: user.id,
                username: user.username,
                team_name: user.team_name,
                is_active: user.is_active,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewAssignmentsResponse {
    pub(crate) user_id: String,
    pub(crate) pull_requests: Vec<PullRequestSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PullRequestSummary {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: PullRequestStatus,
}

impl From<PullRequest> for PullRequestSummary {
    fn from(pull_request: PullRequest) -> Self {
        Self {
            pull_request_id: pull_request.id,
            pull_request_name: pull_request.name,
            author_id: pull_request.author_id,
            status: pull_request.status,
        }
    }
}

// ── Pull requests ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePullRequestRequest {
    pub(crate) pull_request_id: String,
    pub(crate) pull_request_name: String,
    pub(crate) author_id: String,
}

impl From<CreatePullRequestRequest> for NewPullRequest {
    fn from(request: CreatePullRequestRequest) -> Self {
        Self {
            id: request.pull_request_id,
            name: request.pull_request_name,
            author_id: request.author_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MergePullRequestRequest {
    pub(crate) pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReassignReviewerRequest {
    pub(crate) pull_request_id: String,
    pub(crate) old_user_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReassignReviewerResponse {
    pub(crate) replaced_by: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PullRequestEnvelope<T> {
    pr: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct PullRequestBody {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
    status: PullRequestStatus,
    assigned_reviewers: Vec<String>,
}

impl From<PullRequestWithReviewers> for PullRequestEnvelope<PullRequestBody> {
    fn from(created: PullRequestWithReviewers) -> Self {
        Self {
            pr: PullRequestBody {
                pull_request_id: created.pull_request.id,
                pull_request_name: created.pull_request.name,
                author_id: created.pull_request.author_id,
                status: created.pull_request.status,
                assigned_reviewers: created.assigned_reviewers,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MergedPullRequestBody {
    #[serde(flatten)]
    pull_request: PullRequestBody,
    #[serde(rename = "mergedAt")]
    merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequestWithReviewers> for PullRequestEnvelope<MergedPullRequestBody> {
    fn from(merged: PullRequestWithReviewers) -> Self {
        let merged_at = merged.pull_request.merged_at;
        let PullRequestEnvelope { pr } = PullRequestEnvelope::<PullRequestBody>::from(merged);
        Self {
            pr: MergedPullRequestBody {
                pull_request: pr,
                merged_at,
            },
        }
    }
}
