//! Aggregate review statistics.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Pull request counts by status and reviewer load per user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_pr: i64,
    pub open_pr: i64,
    pub merged_pr: i64,
    pub reviewers: Vec<ReviewerStat>,
}

/// Number of pull requests (any status) a user is a reviewer of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReviewerStat {
    pub user_id: String,
    pub count: i64,
}
