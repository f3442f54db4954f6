//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pr_reviewer_lib::db::{self, pool::DbPool, SqliteDirectory, SqlitePrStore};
use pr_reviewer_lib::models::{PullRequest, User};
use pr_reviewer_lib::ports::{Directory, FixedClock, PullRequestStore};
use pr_reviewer_lib::services::AssignmentEngine;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

/// A throwaway SQLite database with the storage adapters and a seeded engine.
pub struct Harness {
    /// Keeps the database directory alive for the test's duration.
    pub dir: TempDir,
    pub pool: DbPool,
    pub directory: Arc<SqliteDirectory>,
    pub store: Arc<SqlitePrStore>,
    pub clock: Arc<FixedClock>,
    pub engine: AssignmentEngine,
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
}

impl Harness {
    pub async fn new(seed: u64) -> Self {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("reviews.db"), 4)
            .await
            .unwrap();

        let directory = Arc::new(SqliteDirectory::new(pool.clone()));
        let store = Arc::new(SqlitePrStore::new(pool.clone()));
        let clock = Arc::new(FixedClock::new(t0()));
        let engine = AssignmentEngine::new(directory.clone(), store.clone())
            .with_clock(clock.clone())
            .with_rng(StdRng::seed_from_u64(seed));

        Self {
            dir,
            pool,
            directory,
            store,
            clock,
            engine,
        }
    }

    /// Create `team` with the given `(user_id, is_active)` members.
    pub async fn team(&self, team: &str, members: &[(&str, bool)]) {
        self.directory.create_team(team).await.unwrap();
        let users: Vec<User> = members
            .iter()
            .map(|(id, active)| User::new(*id, format!("name-{}", id), team, *active))
            .collect();
        self.directory
            .upsert_team_members(team, &users)
            .await
            .unwrap();
    }

    /// Insert an open pull request with an exact reviewer set, bypassing selection.
    pub async fn open_pr(&self, id: &str, author: &str, reviewers: &[&str]) {
        let pr = PullRequest::open(
            id,
            format!("PR {}", id),
            author,
            reviewers.iter().map(|r| r.to_string()).collect(),
            t0(),
        );
        self.store.create(&pr).await.unwrap();
    }

    pub async fn reviewers(&self, pr_id: &str) -> Vec<String> {
        self.store
            .get_with_reviewers(pr_id)
            .await
            .unwrap()
            .unwrap()
            .assigned_reviewers
    }

    pub async fn is_active(&self, user_id: &str) -> bool {
        self.directory
            .get_user(user_id)
            .await
            .unwrap()
            .unwrap()
            .is_active
    }
}
