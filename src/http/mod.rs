//! HTTP interface of the review rotation service.
//!
//! A thin axum layer: handlers decode JSON bodies or query strings, reject
//! blank identifiers, call the [`ReviewService`], and render its outcome as
//! JSON. Errors use the `{"error": {"code", "message"}}` envelope.

mod dto;
mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::review::ReviewService;

/// State shared by every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    service: Arc<dyn ReviewService>,
}

/// Builds the service router with request tracing.
#[must_use]
pub fn router(service: Arc<dyn ReviewService>) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/healthcheck", get(handlers::healthcheck))
        .route("/team/add", post(handlers::add_team))
        .route("/team/get", get(handlers::get_team))
        .route("/team/stats", get(handlers::team_stats))
        .route("/users/setIsActive", post(handlers::set_is_active))
        .route("/users/getReview", get(handlers::get_review))
        .route("/pullRequest/create", post(handlers::create_pull_request))
        .route("/pullRequest/merge", post(handlers::merge_pull_request))
        .route("/pullRequest/reassign", post(handlers::reassign_reviewer))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

#[cfg(test)]
mod tests;
