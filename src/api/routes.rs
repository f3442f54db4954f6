//! REST routes for teams, users, pull requests and stats.
//!
//! Handlers only parse input, call the services and wrap results in the
//! response envelopes; all rules live in the services.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiErr;
use crate::api::ApiState;
use crate::models::{PullRequest, PullRequestShort, Team, TeamMember, User};

// ── Request / response bodies ────────────────────────────────────────────────

#[derive(Deserialize)]
struct AddTeamRequest {
    team_name: String,
    #[serde(default)]
    members: Vec<TeamMember>,
}

#[derive(Deserialize)]
struct TeamQuery {
    team_name: String,
}

#[derive(Deserialize)]
struct DeactivateRequest {
    team_name: String,
    #[serde(default)]
    user_ids: Vec<String>,
}

#[derive(Deserialize)]
struct SetIsActiveRequest {
    user_id: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
struct CreatePrRequest {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
}

#[derive(Deserialize)]
struct MergePrRequest {
    pull_request_id: String,
}

#[derive(Deserialize)]
struct ReassignRequest {
    pull_request_id: String,
    old_user_id: String,
}

#[derive(Serialize)]
struct TeamResponse {
    team: Team,
}

#[derive(Serialize)]
struct UserResponse {
    user: User,
}

#[derive(Serialize)]
struct ReviewResponse {
    user_id: String,
    pull_requests: Vec<PullRequestShort>,
}

#[derive(Serialize)]
struct PrResponse {
    pr: PullRequest,
}

#[derive(Serialize)]
struct ReassignResponse {
    pr: PullRequest,
    replaced_by: String,
}

// ── Route builders ───────────────────────────────────────────────────────────

/// `GET /health`
pub fn health_routes() -> Router<ApiState> {
    Router::new().route("/health", get(health))
}

/// Team and user endpoints.
pub fn team_routes() -> Router<ApiState> {
    Router::new()
        .route("/team/add", post(add_team))
        .route("/team/get", get(get_team))
        .route("/team/deactivate", post(deactivate_team_members))
        .route("/users/setIsActive", post(set_is_active))
        .route("/users/getReview", get(get_review))
}

/// Pull request lifecycle and stats endpoints.
pub fn pull_request_routes() -> Router<ApiState> {
    Router::new()
        .route("/pullRequest/create", post(create_pull_request))
        .route("/pullRequest/merge", post(merge_pull_request))
        .route("/pullRequest/reassign", post(reassign_reviewer))
        .route("/stats", get(get_stats))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn add_team(
    State(state): State<ApiState>,
    payload: Result<Json<AddTeamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(body) = payload?;
    let team = state.teams.add_team(&body.team_name, body.members).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

async fn get_team(
    State(state): State<ApiState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiErr> {
    let Query(query) = query?;
    Ok(Json(state.teams.get_team(&query.team_name).await?))
}

async fn deactivate_team_members(
    State(state): State<ApiState>,
    payload: Result<Json<DeactivateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(body) = payload?;
    let report = state
        .engine
        .deactivate_team_members(&body.team_name, &body.user_ids)
        .await?;
    Ok(Json(report))
}

async fn set_is_active(
    State(state): State<ApiState>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiErr> {
    let Json(body) = payload?;
    let user = state.users.set_is_active(&body.user_id, body.is_active).await?;
    Ok(Json(UserResponse { user }))
}

async fn get_review(
    State(state): State<ApiState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<ReviewResponse>, ApiErr> {
    let Query(query) = query?;
    let pull_requests = state.users.get_review_prs(&query.user_id).await?;
    Ok(Json(ReviewResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}

async fn create_pull_request(
    State(state): State<ApiState>,
    payload: Result<Json<CreatePrRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(body) = payload?;
    let pr = state
        .engine
        .create_pull_request(&body.pull_request_id, &body.pull_request_name, &body.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(PrResponse { pr })))
}

async fn merge_pull_request(
    State(state): State<ApiState>,
    payload: Result<Json<MergePrRequest>, JsonRejection>,
) -> Result<Json<PrResponse>, ApiErr> {
    let Json(body) = payload?;
    let pr = state.engine.merge_pull_request(&body.pull_request_id).await?;
    Ok(Json(PrResponse { pr }))
}

async fn reassign_reviewer(
    State(state): State<ApiState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiErr> {
    let Json(body) = payload?;
    let reassignment = state
        .engine
        .reassign_reviewer(&body.pull_request_id, &body.old_user_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: reassignment.pull_request,
        replaced_by: reassignment.replaced_by,
    }))
}

async fn get_stats(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiErr> {
    Ok(Json(state.stats.get_stats().await?))
}
