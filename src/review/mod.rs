//! Reviewer assignment and pull request lifecycle.
//!
//! [`ReviewEngine`] combines the team and pull request repositories with a
//! [`ReviewerSelectionPolicy`]; [`BlockingReviewService`] exposes it to async
//! callers.

mod engine;
mod error;
pub mod model;
pub mod policy;
mod repository;
mod service;

pub use engine::ReviewEngine;
pub use error::{ErrorKind, ReviewError};
pub use model::{
    MAX_REVIEWERS, MergeOutcome, NewPullRequest, NewTeam, PullRequest, PullRequestStatus,
    PullRequestWithReviewers, TeamMember, TeamStats, TeamWithMembers, User,
};
pub use policy::ReviewerSelectionPolicy;
pub use repository::{PullRequestRepository, TeamRepository};
pub use service::{BlockingReviewService, ReviewService};

#[cfg(test)]
pub(crate) use service::MockReviewService;
