//! Route handlers.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::review::NewPullRequest;

use super::AppState;
use super::dto::{
    AddTeamRequest, CreatePullRequestRequest, MergePullRequestRequest, MergedPullRequestBody,
    PingResponse, PullRequestBody, PullRequestEnvelope, ReassignReviewerRequest,
    ReassignReviewerResponse, ReviewAssignmentsResponse, SetIsActiveRequest, TeamQuery,
    TeamResponse, TeamStatsResponse, UserEnvelope, UserQuery,
};
use super::error::ApiError;

type ApiResult<T> = Result<T, ApiError>;

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("rejected request body: {rejection}");
        ApiError::InvalidJson
    })
}

fn decode_query<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query.map(|Query(params)| params).map_err(|rejection| {
        tracing::debug!("rejected query string: {rejection}");
        ApiError::InvalidJson
    })
}

fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::blank(field))
    } else {
        Ok(())
    }
}

/// GET /ping
pub(crate) async fn ping() -> Json<PingResponse> {
    Json(PingResponse { message: "pong" })
}

/// GET|HEAD /healthcheck
pub(crate) async fn healthcheck() -> StatusCode {
    StatusCode::OK
}

/// POST /team/add
pub(crate) async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<AddTeamRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let request = decode(payload)?;
    for (field, value) in request.identifiers() {
        require(field, value)?;
    }

    let team = state.service.add_team(request.into_new_team()).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))))
}

/// GET /team/get?team_name=
pub(crate) async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> ApiResult<Json<TeamResponse>> {
    let TeamQuery { team_name } = decode_query(query)?;
    require("team_name", &team_name)?;

    let team = state.service.get_team(team_name).await?;
    Ok(Json(TeamResponse::from(team)))
}

/// GET /team/stats?team_name=
pub(crate) async fn team_stats(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> ApiResult<Json<TeamStatsResponse>> {
    let TeamQuery { team_name } = decode_query(query)?;
    require("team_name", &team_name)?;

    let stats = state.service.team_stats(team_name).await?;
    Ok(Json(TeamStatsResponse::from(stats)))
}

/// POST /users/setIsActive
pub(crate) async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> ApiResult<Json<UserEnvelope>> {
    let SetIsActiveRequest { user_id, is_active } = decode(payload)?;
    require("user_id", &user_id)?;

    let user = state.service.set_user_active(user_id, is_active).await?;
    Ok(Json(UserEnvelope::from(user)))
}

/// GET /users/getReview?user_id=
pub(crate) async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<ReviewAssignmentsResponse>> {
    let UserQuery { user_id } = decode_query(query)?;
    require("user_id", &user_id)?;

    let pull_requests = state.service.review_assignments(user_id.clone()).await?;
    Ok(Json(ReviewAssignmentsResponse {
        user_id,
        pull_requests: pull_requests.into_iter().map(Into::into).collect(),
    }))
}

/// POST /pullRequest/create
pub(crate) async fn create_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PullRequestEnvelope<PullRequestBody>>)> {
    let request = decode(payload)?;
    require("pull_request_id", &request.pull_request_id)?;
    require("author_id", &request.author_id)?;

    let created = state
        .service
        .create_pull_request(NewPullRequest::from(request))
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// POST /pullRequest/merge
pub(crate) async fn merge_pull_request(
    State(state): State<AppState>,
    payload: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> ApiResult<Json<PullRequestEnvelope<MergedPullRequestBody>>> {
    let MergePullRequestRequest { pull_request_id } = decode(payload)?;
    require("pull_request_id", &pull_request_id)?;

    let merged = state.service.merge_pull_request(pull_request_id).await?;
    Ok(Json(merged.into()))
}

/// POST /pullRequest/reassign
pub(crate) async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignReviewerRequest>, JsonRejection>,
) -> ApiResult<Json<ReassignReviewerResponse>> {
    let ReassignReviewerRequest {
        pull_request_id,
        old_user_id,
    } = decode(payload)?;
    require("pull_request_id", &pull_request_id)?;
    require("old_user_id", &old_user_id)?;

    let replaced_by = state
        .service
        .reassign_reviewer(pull_request_id, old_user_id)
        .await?;
    Ok(Json(ReassignReviewerResponse { replaced_by }))
}
