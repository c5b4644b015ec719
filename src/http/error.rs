//! Mapping of request failures onto JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::review::ReviewError;

use super::dto::{ErrorBody, ErrorEnvelope};

/// Failure of a single HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiError {
    /// The body or query string could not be decoded.
    InvalidJson,
    /// A decoded request carried an unusable value.
    InvalidRequest { message: String },
    /// The review service rejected the request.
    Review(ReviewError),
}

impl ApiError {
    pub(crate) fn blank(field: &str) -> Self {
        Self::InvalidRequest {
            message: format!("{field} must not be blank"),
        }
    }

    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            Self::InvalidJson => (
                StatusCode::BAD_REQUEST,
                "INVALID_JSON",
                "invalid JSON".to_owned(),
            ),
            Self::InvalidRequest { message } => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
            }
            Self::Review(error) => {
                let (status, code) = review_status(error);
                (status, code, error.to_string())
            }
        }
    }
}

const fn review_status(error: ReviewError) -> (StatusCode, &'static str) {
    match error {
        ReviewError::TeamAlreadyExists => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
        ReviewError::TeamNotFound | ReviewError::UserNotFound | ReviewError::PullRequestNotFound => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        ReviewError::PullRequestAlreadyExists => (StatusCode::CONFLICT, "PR_EXISTS"),
        ReviewError::PullRequestMerged => (StatusCode::CONFLICT, "PR_MERGED"),
        ReviewError::ReviewerNotAssigned => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
        ReviewError::NoReplacementCandidate => (StatusCode::CONFLICT, "NO_CANDIDATE"),
        ReviewError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl From<ReviewError> for ApiError {
    fn from(error: ReviewError) -> Self {
        Self::Review(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (
            status,
            Json(ErrorEnvelope {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
