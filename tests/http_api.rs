//! HTTP round-trips through the full router.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so routing, JSON
//! extraction, error mapping and middleware are exercised without a socket.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::Harness;
use pr_reviewer_lib::api::{self, ApiState};
use pr_reviewer_lib::services::AssignmentEngine;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

async fn app() -> (Harness, Router) {
    let h = Harness::new(11).await;
    let engine = AssignmentEngine::new(h.directory.clone(), h.store.clone())
        .with_clock(h.clock.clone())
        .with_rng(StdRng::seed_from_u64(11));
    let state = ApiState::new(h.directory.clone(), h.store.clone(), engine);
    let router = api::router(state, Duration::from_secs(5));
    (h, router)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

async fn add_backend(router: &Router) {
    let (status, _) = post(
        router,
        "/team/add",
        json!({
            "team_name": "backend",
            "members": [
                {"user_id": "u1", "username": "Alice", "is_active": true},
                {"user_id": "u2", "username": "Bob", "is_active": true},
                {"user_id": "u3", "username": "Carol", "is_active": true},
                {"user_id": "u4", "username": "Dave", "is_active": true}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn error_code(body: &Value) -> &str {
    assert_eq!(body["status"], "ERROR");
    body["error"]["code"].as_str().unwrap()
}

#[tokio::test]
async fn health_check() {
    let (_h, router) = app().await;

    let (status, body) = get(&router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn team_add_and_get() {
    let (_h, router) = app().await;
    add_backend(&router).await;

    let (status, body) = get(&router, "/team/get?team_name=backend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team_name"], "backend");
    assert_eq!(body["members"].as_array().unwrap().len(), 4);
    assert_eq!(body["members"][0]["user_id"], "u1");

    let (status, body) = post(&router, "/team/add", json!({"team_name": "backend"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "TEAM_EXISTS");

    let (status, body) = get(&router, "/team/get?team_name=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn pull_request_lifecycle() {
    let (_h, router) = app().await;
    add_backend(&router).await;

    let (status, body) = post(
        &router,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Add search", "author_id": "u1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let pr = &body["pr"];
    assert_eq!(pr["pull_request_id"], "pr-1");
    assert_eq!(pr["status"], "OPEN");
    assert!(pr["merged_at"].is_null());
    let reviewers: Vec<String> = serde_json::from_value(pr["assigned_reviewers"].clone()).unwrap();
    assert_eq!(reviewers.len(), 2);
    assert!(!reviewers.contains(&"u1".to_string()));

    let (status, body) = post(
        &router,
        "/pullRequest/create",
        json!({"pull_request_id": "pr-1", "pull_request_name": "Again", "author_id": "u1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "PR_EXISTS");

    let old = reviewers[0].clone();
    let (status, body) = post(
        &router,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": old}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let replaced_by = body["replaced_by"].as_str().unwrap().to_string();
    assert_ne!(replaced_by, old);
    assert_ne!(replaced_by, "u1");

    let (status, body) = get(&router, &format!("/users/getReview?user_id={}", replaced_by)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], replaced_by.as_str());
    assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");

    let (status, body) = post(&router, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr"]["status"], "MERGED");
    let merged_at = body["pr"]["merged_at"].clone();
    assert!(!merged_at.is_null());

    let (status, body) = post(&router, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pr"]["merged_at"], merged_at);

    let (status, body) = post(
        &router,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": replaced_by}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "PR_MERGED");
}

#[tokio::test]
async fn reassign_error_codes() {
    let (h, router) = app().await;
    h.team("small", &[("a1", true), ("a2", true), ("a3", true)])
        .await;
    h.open_pr("pr-1", "a1", &["a2", "a3"]).await;

    let (status, body) = post(
        &router,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": "a1"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "NOT_ASSIGNED");

    let (status, body) = post(
        &router,
        "/pullRequest/reassign",
        json!({"pull_request_id": "pr-1", "old_user_id": "a2"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), "NO_CANDIDATE");

    let (status, body) = post(
        &router,
        "/pullRequest/reassign",
        json!({"pull_request_id": "missing", "old_user_id": "a2"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let (_h, router) = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/pullRequest/create")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let (status, body) = post(&router, "/pullRequest/merge", json!({"id": "pr-1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let (status, body) = post(
        &router,
        "/pullRequest/create",
        json!({"pull_request_id": "", "pull_request_name": "x", "author_id": "u1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");

    let (status, body) = get(&router, "/users/getReview").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "BAD_REQUEST");
}

#[tokio::test]
async fn users_set_is_active() {
    let (_h, router) = app().await;
    add_backend(&router).await;

    let (status, body) = post(
        &router,
        "/users/setIsActive",
        json!({"user_id": "u2", "is_active": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_id"], "u2");
    assert_eq!(body["user"]["team_name"], "backend");
    assert_eq!(body["user"]["is_active"], false);

    let (status, body) = post(
        &router,
        "/users/setIsActive",
        json!({"user_id": "ghost", "is_active": false}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn team_deactivate_reports_counts() {
    let (h, router) = app().await;
    add_backend(&router).await;
    h.open_pr("pr-1", "u1", &["u2"]).await;

    let (status, body) = post(
        &router,
        "/team/deactivate",
        json!({"team_name": "backend", "user_ids": ["u2", "u3"]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "team_name": "backend",
            "deactivated": ["u2", "u3"],
            "reassigned_count": 1,
            "removed_count": 0
        })
    );
    assert_eq!(h.reviewers("pr-1").await, vec!["u4"]);
}

#[tokio::test]
async fn stats_counts_prs_and_reviewer_load() {
    let (h, router) = app().await;
    add_backend(&router).await;
    h.open_pr("pr-1", "u1", &["u2", "u3"]).await;
    h.open_pr("pr-2", "u1", &["u2"]).await;
    let (status, _) = post(&router, "/pullRequest/merge", json!({"pull_request_id": "pr-2"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&router, "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_pr"], 2);
    assert_eq!(body["open_pr"], 1);
    assert_eq!(body["merged_pr"], 1);
    assert_eq!(
        body["reviewers"],
        json!([
            {"user_id": "u2", "count": 2},
            {"user_id": "u3", "count": 1}
        ])
    );
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (_h, router) = app().await;

    let (status, _) = get(&router, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn state_is_shareable_across_clones() {
    let (h, _router) = app().await;
    let state = ApiState::from_pool(h.pool.clone());
    let a = api::router(state.clone(), Duration::from_secs(1));
    let b = api::router(state, Duration::from_secs(1));

    add_backend(&a).await;
    let (status, body) = get(&b, "/team/get?team_name=backend").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().map(Vec::len), Some(4));
}
