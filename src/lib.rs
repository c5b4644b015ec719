//! Review rotation service: assigns pull request reviewers from the author's
//! team.
//!
//! Teams and users are upserted in bulk; creating a pull request picks up to
//! two active teammates of the author as reviewers. Reviewers can be swapped
//! for another teammate while the pull request is open, and merging freezes
//! the reviewer set. State lives in `SQLite` through Diesel and is served over
//! a JSON HTTP API built on axum.

pub mod config;
pub mod error;
pub mod http;
pub mod persistence;
pub mod review;
pub mod telemetry;

pub use config::ReviewRotaConfig;
pub use error::AppError;
pub use http::router;
pub use persistence::{DatabasePool, PersistenceError, PullRequestStore, TeamStore};
pub use review::{
    BlockingReviewService, ReviewEngine, ReviewError, ReviewService, ReviewerSelectionPolicy,
};
