//! HTTP API.
//!
//! An axum router over the services, plus the server loop that runs it
//! until the shutdown token fires.

pub mod error;
pub mod request_log;
pub mod routes;
pub mod server;

pub use error::ApiErr;
pub use server::serve;

use axum::http::StatusCode;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::db::pool::DbPool;
use crate::db::{SqliteDirectory, SqlitePrStore};
use crate::ports::{Directory, PullRequestStore};
use crate::services::{AssignmentEngine, StatsService, TeamService, UserService};

/// Shared state for the axum routes.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<AssignmentEngine>,
    pub teams: TeamService,
    pub users: UserService,
    pub stats: StatsService,
}

impl ApiState {
    /// Wire the services over the given ports and engine.
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn PullRequestStore>,
        engine: AssignmentEngine,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            teams: TeamService::new(directory.clone()),
            users: UserService::new(directory, store.clone()),
            stats: StatsService::new(store),
        }
    }

    /// Production wiring: SQLite adapters and an entropy-seeded engine.
    pub fn from_pool(pool: DbPool) -> Self {
        let directory: Arc<dyn Directory> = Arc::new(SqliteDirectory::new(pool.clone()));
        let store: Arc<dyn PullRequestStore> = Arc::new(SqlitePrStore::new(pool));
        let engine = AssignmentEngine::new(directory.clone(), store.clone());
        Self::new(directory, store, engine)
    }
}

/// Build the full router with logging, CORS and a per-request timeout.
pub fn router(state: ApiState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::team_routes())
        .merge(routes::pull_request_routes())
        .with_state(state)
        .layer(timeout_layer(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_log::log_requests))
}

fn timeout_layer(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout)
}
