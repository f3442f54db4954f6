//! Pull request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of a pull request. `Open -> Merged` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl std::fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pull request together with its reviewer set.
///
/// Invariants: `merged_at` is set iff `status` is `Merged`; the author is
/// never in `assigned_reviewers`; reviewers contain no duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PullRequest {
    pub pull_request_id: String,

    pub pull_request_name: String,

    pub author_id: String,

    pub status: PullRequestStatus,

    /// Reviewer user ids, sorted. Loaded from `pull_request_reviewers`.
    #[sqlx(skip)]
    pub assigned_reviewers: Vec<String>,

    pub created_at: DateTime<Utc>,

    /// Set exactly once, on the first transition to `Merged`.
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Build a freshly opened pull request.
    pub fn open(
        pull_request_id: impl Into<String>,
        pull_request_name: impl Into<String>,
        author_id: impl Into<String>,
        assigned_reviewers: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            pull_request_name: pull_request_name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            assigned_reviewers,
            created_at,
            merged_at: None,
        }
    }

    /// Check if the pull request is merged.
    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    /// Check if the given user is currently a reviewer.
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }
}

/// Pull request summary used in per-reviewer listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}
