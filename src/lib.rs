//! PR Reviewer - team-based pull request reviewer assignment service.
//!
//! Assigns reviewers to pull requests from the author's team, keeps the
//! assignments valid across reassignments and team deactivations, and
//! exposes it all over a small JSON HTTP API backed by SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ports;
pub mod services;

use tokio_util::sync::CancellationToken;

use crate::config::{AppEnv, Config};
use crate::error::AppError;

/// Start the service and block until a shutdown signal arrives.
pub async fn run() -> Result<(), AppError> {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            config::init_logger(AppEnv::default());
            return Err(AppError::internal(e.to_string()));
        }
    };
    config::init_logger(config.app_env);

    log::info!(
        "[server] Starting ({:?}), database {}",
        config.app_env,
        config.database_path.display()
    );

    let pool = db::initialize(&config.database_path, config.database_max_connections).await?;

    let app = api::router(api::ApiState::from_pool(pool.clone()), config.request_timeout);

    let cancel = CancellationToken::new();
    tokio::spawn(api::server::shutdown_on_signal(cancel.clone()));

    let result = api::serve(config.http_address, app, cancel).await;

    pool.close().await;
    result
}
