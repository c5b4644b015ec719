//! Router tests over a mocked review service.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::DateTime;
use rstest::rstest;
use serde_json::{Value, json};
use tower::ServiceExt;

use super::router;
use crate::review::{
    MockReviewService, PullRequest, PullRequestStatus, PullRequestWithReviewers, ReviewError,
    TeamStats, TeamWithMembers, User,
};

fn app(service: MockReviewService) -> Router {
    router(Arc::new(service))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be JSON")
    };
    (status, value)
}

fn pull_request(status: PullRequestStatus) -> PullRequestWithReviewers {
    let created_at = DateTime::from_timestamp_millis(1_760_000_000_000).unwrap_or_default();
    PullRequestWithReviewers {
        pull_request: PullRequest {
            id: "pr1".to_owned(),
            name: "Add rota".to_owned(),
            author_id: "u1".to_owned(),
            status,
            created_at,
            merged_at: (status == PullRequestStatus::Merged).then_some(created_at),
        },
        assigned_reviewers: vec!["u2".to_owned(), "u3".to_owned()],
    }
}

#[tokio::test]
async fn ping_answers_pong() {
    let (status, body) = send(app(MockReviewService::new()), Method::GET, "/ping", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "pong"}));
}

#[rstest]
#[case::get(Method::GET)]
#[case::head(Method::HEAD)]
#[tokio::test]
async fn healthcheck_is_ok(#[case] method: Method) {
    let (status, _) = send(app(MockReviewService::new()), method, "/healthcheck", None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_pull_request_returns_created() {
    let mut service = MockReviewService::new();
    service
        .expect_create_pull_request()
        .withf(|request| request.id == "pr1" && request.author_id == "u1")
        .times(1)
        .returning(|_| Ok(pull_request(PullRequestStatus::Open)));

    let (status, body) = send(
        app(service),
        Method::POST,
        "/pullRequest/create",
        Some(json!({
            "pull_request_id": "pr1",
            "pull_request_name": "Add rota",
            "author_id": "u1"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({"pr": {
            "pull_request_id": "pr1",
            "pull_request_name": "Add rota",
            "author_id": "u1",
            "status": "OPEN",
            "assigned_reviewers": ["u2", "u3"]
        }})
    );
}

#[tokio::test]
async fn merge_includes_merge_time() {
    let mut service = MockReviewService::new();
    service
        .expect_merge_pull_request()
        .withf(|id| id == "pr1")
        .times(1)
        .returning(|_| Ok(pull_request(PullRequestStatus::Merged)));

    let (status, body) = send(
        app(service),
        Method::POST,
        "/pullRequest/merge",
        Some(json!({"pull_request_id": "pr1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr"]["status"], "MERGED");
    assert_eq!(body["pr"]["mergedAt"], "2025-10-09T08:53:20Z");
    assert_eq!(body["pr"]["assigned_reviewers"], json!(["u2", "u3"]));
}

#[tokio::test]
async fn reassign_reports_replacement() {
    let mut service = MockReviewService::new();
    service
        .expect_reassign_reviewer()
        .withf(|id, old| id == "pr1" && old == "u2")
        .times(1)
        .returning(|_, _| Ok("u3".to_owned()));

    let (status, body) = send(
        app(service),
        Method::POST,
        "/pullRequest/reassign",
        Some(json!({"pull_request_id": "pr1", "old_user_id": "u2"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"replaced_by": "u3"}));
}

#[rstest]
#[case::team_exists(ReviewError::TeamAlreadyExists, StatusCode::BAD_REQUEST, "TEAM_EXISTS", "team already exists")]
#[case::team(ReviewError::TeamNotFound, StatusCode::NOT_FOUND, "NOT_FOUND", "team not found")]
#[case::user(ReviewError::UserNotFound, StatusCode::NOT_FOUND, "NOT_FOUND", "user not found")]
#[case::pr(ReviewError::PullRequestNotFound, StatusCode::NOT_FOUND, "NOT_FOUND", "PR not found")]
#[case::pr_exists(ReviewError::PullRequestAlreadyExists, StatusCode::CONFLICT, "PR_EXISTS", "PR id already exists")]
#[case::merged(ReviewError::PullRequestMerged, StatusCode::CONFLICT, "PR_MERGED", "cannot reassign on merged PR")]
#[case::not_assigned(ReviewError::ReviewerNotAssigned, StatusCode::CONFLICT, "NOT_ASSIGNED", "reviewer is not assigned to this PR")]
#[case::no_candidate(ReviewError::NoReplacementCandidate, StatusCode::CONFLICT, "NO_CANDIDATE", "no candidate for reassignment")]
#[case::internal(ReviewError::Internal, StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "internal error")]
#[tokio::test]
async fn review_errors_map_to_envelopes(
    #[case] error: ReviewError,
    #[case] expected_status: StatusCode,
    #[case] code: &str,
    #[case] message: &str,
) {
    let mut service = MockReviewService::new();
    service
        .expect_reassign_reviewer()
        .times(1)
        .returning(move |_, _| Err(error));

    let (status, body) = send(
        app(service),
        Method::POST,
        "/pullRequest/reassign",
        Some(json!({"pull_request_id": "pr1", "old_user_id": "u2"})),
    )
    .await;

    assert_eq!(status, expected_status);
    assert_eq!(body, json!({"error": {"code": code, "message": message}}));
}

#[rstest]
#[case::not_json("/pullRequest/create", "{not json")]
#[case::missing_field("/pullRequest/merge", "{}")]
#[case::wrong_type("/users/setIsActive", r#"{"user_id": "u1", "is_active": "yes"}"#)]
#[tokio::test]
async fn undecodable_bodies_are_invalid_json(#[case] uri: &str, #[case] raw: &str) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(raw.to_owned()))
        .expect("request should build");

    let response = app(MockReviewService::new())
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let body: Value = serde_json::from_slice(&bytes).expect("body should be JSON");

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_JSON");
}

#[tokio::test]
async fn missing_query_parameter_is_invalid_json() {
    let (status, body) = send(app(MockReviewService::new()), Method::GET, "/team/get", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_JSON");
}

#[rstest]
#[case::blank_pull_request(
    "/pullRequest/create",
    json!({"pull_request_id": " ", "pull_request_name": "x", "author_id": "u1"})
)]
#[case::blank_reviewer(
    "/pullRequest/reassign",
    json!({"pull_request_id": "pr1", "old_user_id": ""})
)]
#[case::blank_member(
    "/team/add",
    json!({"team_name": "core", "members": [{"user_id": "", "username": "x", "is_active": true}]})
)]
#[tokio::test]
async fn blank_identifiers_are_rejected(#[case] uri: &str, #[case] payload: Value) {
    let (status, body) = send(app(MockReviewService::new()), Method::POST, uri, Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn add_team_echoes_members() {
    let mut service = MockReviewService::new();
    service
        .expect_add_team()
        .withf(|team| team.team_name == "core" && team.members.len() == 1)
        .times(1)
        .returning(|team| {
            Ok(TeamWithMembers {
                team_name: team.team_name.clone(),
                members: team
                    .members
                    .iter()
                    .cloned()
                    .map(|member| member.into_user("core"))
                    .collect(),
            })
        });

    let (status, body) = send(
        app(service),
        Method::POST,
        "/team/add",
        Some(json!({
            "team_name": "core",
            "members": [{"user_id": "u1", "username": "alice", "is_active": true}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({
            "team_name": "core",
            "members": [{"user_id": "u1", "username": "alice", "is_active": true}]
        })
    );
}

#[tokio::test]
async fn team_stats_use_short_names() {
    let mut service = MockReviewService::new();
    service
        .expect_team_stats()
        .withf(|name| name == "core")
        .times(1)
        .returning(|name| {
            Ok(TeamStats {
                team_name: name,
                active_users: 3,
                inactive_users: 1,
                open_pull_requests: 2,
                merged_pull_requests: 5,
            })
        });

    let (status, body) = send(
        app(service),
        Method::GET,
        "/team/stats?team_name=core",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "team_name": "core",
            "active_users": 3,
            "inactive_users": 1,
            "open_prs": 2,
            "merged_prs": 5
        })
    );
}

#[tokio::test]
async fn set_is_active_wraps_user() {
    let mut service = MockReviewService::new();
    service
        .expect_set_user_active()
        .withf(|id, is_active| id == "u2" && !*is_active)
        .times(1)
        .returning(|id, is_active| {
            Ok(User {
                id,
                username: "bob".to_owned(),
                team_name: "core".to_owned(),
                is_active,
            })
        });

    let (status, body) = send(
        app(service),
        Method::POST,
        "/users/setIsActive",
        Some(json!({"user_id": "u2", "is_active": false})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"user": {"user_id": "u2", "username": "bob", "team_name": "core", "is_active": false}})
    );
}

#[tokio::test]
async fn get_review_lists_short_pull_requests() {
    let mut service = MockReviewService::new();
    service
        .expect_review_assignments()
        .withf(|id| id == "u2")
        .times(1)
        .returning(|_| Ok(vec![pull_request(PullRequestStatus::Open).pull_request]));

    let (status, body) = send(
        app(service),
        Method::GET,
        "/users/getReview?user_id=u2",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "user_id": "u2",
            "pull_requests": [{
                "pull_request_id": "pr1",
                "pull_request_name": "Add rota",
                "author_id": "u1",
                "status": "OPEN"
            }]
        })
    );
}
