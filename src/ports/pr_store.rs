//! Pull request store port.
//!
//! Every mutating operation is a single atomic conditional write at the
//! store boundary. The engine never relies on its own read-then-write
//! sequencing for correctness.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{PullRequest, PullRequestShort, Stats};

/// Persistence for pull requests and their reviewer sets.
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// Insert the pull request row and its reviewer rows in one transaction.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, pr: &PullRequest) -> Result<(), AppError>;

    async fn get_with_reviewers(&self, pr_id: &str) -> Result<Option<PullRequest>, AppError>;

    /// Flip `OPEN -> MERGED` and stamp `now` if still open; otherwise return
    /// the current state unchanged. `None` if the id does not exist.
    async fn merge_if_open(
        &self,
        pr_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PullRequest>, AppError>;

    /// Replace `old_reviewer` with `new_reviewer` while the PR is still open.
    ///
    /// Fails with `NotFound`, `AlreadyMerged` or `ReviewerNotAssigned` when the
    /// old reviewer cannot be dropped, and with `ReviewerAlreadyAssigned` when
    /// `new_reviewer` already holds a slot. Nothing is written on failure.
    async fn swap_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> Result<(), AppError>;

    /// Drop a reviewer slot without replacement while the PR is still open.
    async fn remove_reviewer(&self, pr_id: &str, reviewer: &str) -> Result<(), AppError>;

    /// Ids of open pull requests the user reviews, sorted.
    async fn find_open_pr_ids_by_reviewer(&self, user_id: &str) -> Result<Vec<String>, AppError>;

    /// Summaries of every pull request (any status) the user reviews.
    async fn find_short_by_reviewer(&self, user_id: &str)
        -> Result<Vec<PullRequestShort>, AppError>;

    async fn stats(&self) -> Result<Stats, AppError>;
}
