//! Outcomes reported by the lifecycle engine.

use thiserror::Error;

use crate::persistence::StoreError;

/// Coarse classification of a [`ReviewError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced team, user, or pull request does not exist.
    NotFound,
    /// The request collides with existing state.
    Conflict,
    /// Storage failed; the operation may succeed if retried.
    Internal,
}

/// Errors surfaced by the lifecycle engine and the service built on it.
///
/// Storage detail never crosses this boundary; it is logged where the error
/// is translated.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum ReviewError {
    /// A team with the requested name already exists.
    #[error("team already exists")]
    TeamAlreadyExists,

    /// The referenced team does not exist.
    #[error("team not found")]
    TeamNotFound,

    /// The referenced user does not exist.
    #[error("user not found")]
    UserNotFound,

    /// A pull request with the requested identifier already exists.
    #[error("PR id already exists")]
    PullRequestAlreadyExists,

    /// The referenced pull request does not exist.
    #[error("PR not found")]
    PullRequestNotFound,

    /// The pull request is merged; its reviewers can no longer change.
    #[error("cannot reassign on merged PR")]
    PullRequestMerged,

    /// The user is not one of the pull request's reviewers.
    #[error("reviewer is not assigned to this PR")]
    ReviewerNotAssigned,

    /// No active teammate can take over the review.
    #[error("no candidate for reassignment")]
    NoReplacementCandidate,

    /// Storage or runtime failure.
    #[error("internal error")]
    Internal,
}

impl ReviewError {
    /// Returns the taxonomy bucket for this outcome.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::TeamNotFound | Self::UserNotFound | Self::PullRequestNotFound => {
                ErrorKind::NotFound
            }
            Self::TeamAlreadyExists
            | Self::PullRequestAlreadyExists
            | Self::PullRequestMerged
            | Self::ReviewerNotAssigned
            | Self::NoReplacementCandidate => ErrorKind::Conflict,
            Self::Internal => ErrorKind::Internal,
        }
    }

    /// Returns true when retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self.kind(), ErrorKind::Internal)
    }

    /// Translates a store outcome, logging storage failures under
    /// `operation`.
    pub(crate) fn from_store(error: &StoreError, operation: &str) -> Self {
        let translated = match error {
            StoreError::TeamAlreadyExists => Self::TeamAlreadyExists,
            StoreError::TeamNotFound => Self::TeamNotFound,
            StoreError::UserNotFound => Self::UserNotFound,
            StoreError::PullRequestAlreadyExists => Self::PullRequestAlreadyExists,
            StoreError::PullRequestNotFound => Self::PullRequestNotFound,
            StoreError::PullRequestMerged => Self::PullRequestMerged,
            StoreError::ReviewerNotAssigned => Self::ReviewerNotAssigned,
            StoreError::NoReplacementCandidate => Self::NoReplacementCandidate,
            StoreError::Cancelled => {
                tracing::warn!("{operation} cancelled by the caller; rolled back");
                return Self::Internal;
            }
            StoreError::Persistence(source) => {
                tracing::error!("{operation} failed: {source}");
                return Self::Internal;
            }
        };
        tracing::debug!("{operation} rejected: {error}");
        translated
    }
}
