//! SQLite implementation of the pull request store.
//!
//! Reviewer-set writes are guarded by the pull request's status inside the
//! write statement itself, so a merge that lands between an engine read and
//! a store write can never be overwritten.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db::pool::DbPool;
use crate::db::{is_unique_violation, op_err};
use crate::error::{resource, AppError};
use crate::models::{PullRequest, PullRequestShort, PullRequestStatus, ReviewerStat, Stats};
use crate::ports::PullRequestStore;

const SELECT_PULL_REQUEST: &str = r#"
    SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
    FROM pull_requests
    WHERE pull_request_id = ?
"#;

/// Deletes one reviewer row, but only while the pull request is open.
const GUARDED_DELETE_REVIEWER: &str = r#"
    DELETE FROM pull_request_reviewers
    WHERE pull_request_id = ?
      AND user_id = ?
      AND EXISTS (
          SELECT 1 FROM pull_requests
          WHERE pull_request_id = ? AND status = 'OPEN'
      )
"#;

/// Pull request store backed by `pull_requests` and `pull_request_reviewers`.
#[derive(Clone)]
pub struct SqlitePrStore {
    pool: DbPool,
}

impl SqlitePrStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_reviewers(&self, pr_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            "SELECT user_id FROM pull_request_reviewers WHERE pull_request_id = ? ORDER BY user_id",
        )
        .bind(pr_id)
        .fetch_all(&self.pool)
        .await
        .map_err(op_err("load_reviewers"))
    }

    async fn with_reviewers(&self, mut pr: PullRequest) -> Result<PullRequest, AppError> {
        pr.assigned_reviewers = self.load_reviewers(&pr.pull_request_id).await?;
        Ok(pr)
    }
}

/// Explain why a guarded reviewer delete touched no rows.
async fn diagnose_guard_failure(
    conn: &mut SqliteConnection,
    pr_id: &str,
    reviewer: &str,
) -> Result<AppError, AppError> {
    let status: Option<PullRequestStatus> =
        sqlx::query_scalar("SELECT status FROM pull_requests WHERE pull_request_id = ?")
            .bind(pr_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(op_err("diagnose_guard_failure"))?;

    Ok(match status {
        None => AppError::not_found_with_id(resource::PULL_REQUEST, pr_id),
        Some(PullRequestStatus::Merged) => AppError::already_merged(pr_id),
        Some(PullRequestStatus::Open) => AppError::reviewer_not_assigned(pr_id, reviewer),
    })
}

/// Run the guarded delete on `conn`, turning "no rows" into a typed error.
async fn delete_reviewer_if_open(
    conn: &mut SqliteConnection,
    pr_id: &str,
    reviewer: &str,
    op: &'static str,
) -> Result<(), AppError> {
    let deleted = sqlx::query(GUARDED_DELETE_REVIEWER)
        .bind(pr_id)
        .bind(reviewer)
        .bind(pr_id)
        .execute(&mut *conn)
        .await
        .map_err(op_err(op))?
        .rows_affected();

    if deleted == 0 {
        return Err(diagnose_guard_failure(conn, pr_id, reviewer).await?);
    }

    Ok(())
}

#[async_trait]
impl PullRequestStore for SqlitePrStore {
    async fn create(&self, pr: &PullRequest) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(op_err("create_pull_request"))?;

        sqlx::query(
            r#"
            INSERT INTO pull_requests
                (pull_request_id, pull_request_name, author_id, status, created_at, merged_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pr.pull_request_id)
        .bind(&pr.pull_request_name)
        .bind(&pr.author_id)
        .bind(pr.status)
        .bind(pr.created_at)
        .bind(pr.merged_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists(resource::PULL_REQUEST, &pr.pull_request_id)
            } else {
                AppError::database_with_op(e.to_string(), "create_pull_request")
            }
        })?;

        for reviewer in &pr.assigned_reviewers {
            sqlx::query(
                "INSERT INTO pull_request_reviewers (pull_request_id, user_id) VALUES (?, ?)",
            )
            .bind(&pr.pull_request_id)
            .bind(reviewer)
            .execute(&mut *tx)
            .await
            .map_err(op_err("create_pull_request"))?;
        }

        tx.commit().await.map_err(op_err("create_pull_request"))?;

        Ok(())
    }

    async fn get_with_reviewers(&self, pr_id: &str) -> Result<Option<PullRequest>, AppError> {
        let pr = sqlx::query_as::<_, PullRequest>(SELECT_PULL_REQUEST)
            .bind(pr_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(op_err("get_pull_request"))?;

        match pr {
            Some(pr) => Ok(Some(self.with_reviewers(pr).await?)),
            None => Ok(None),
        }
    }

    async fn merge_if_open(
        &self,
        pr_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PullRequest>, AppError> {
        // Only rows still OPEN are touched, so the first merger's timestamp wins.
        let merged = sqlx::query_as::<_, PullRequest>(
            r#"
            UPDATE pull_requests
            SET status = 'MERGED', merged_at = COALESCE(merged_at, ?)
            WHERE pull_request_id = ? AND status = 'OPEN'
            RETURNING pull_request_id, pull_request_name, author_id, status, created_at, merged_at
            "#,
        )
        .bind(now)
        .bind(pr_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(op_err("merge_pull_request"))?;

        let current = match merged {
            Some(pr) => Some(pr),
            None => sqlx::query_as::<_, PullRequest>(SELECT_PULL_REQUEST)
                .bind(pr_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(op_err("merge_pull_request"))?,
        };

        match current {
            Some(pr) => Ok(Some(self.with_reviewers(pr).await?)),
            None => Ok(None),
        }
    }

    async fn swap_reviewer(
        &self,
        pr_id: &str,
        old_reviewer: &str,
        new_reviewer: &str,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(op_err("swap_reviewer"))?;

        // Dropping `tx` on an early return rolls the delete back.
        delete_reviewer_if_open(&mut tx, pr_id, old_reviewer, "swap_reviewer").await?;

        sqlx::query("INSERT INTO pull_request_reviewers (pull_request_id, user_id) VALUES (?, ?)")
            .bind(pr_id)
            .bind(new_reviewer)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::reviewer_already_assigned(pr_id, new_reviewer)
                } else {
                    AppError::database_with_op(e.to_string(), "swap_reviewer")
                }
            })?;

        tx.commit().await.map_err(op_err("swap_reviewer"))?;

        Ok(())
    }

    async fn remove_reviewer(&self, pr_id: &str, reviewer: &str) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await.map_err(op_err("remove_reviewer"))?;
        delete_reviewer_if_open(&mut conn, pr_id, reviewer, "remove_reviewer").await
    }

    async fn find_open_pr_ids_by_reviewer(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT pr.pull_request_id
            FROM pull_requests pr
            INNER JOIN pull_request_reviewers r ON r.pull_request_id = pr.pull_request_id
            WHERE r.user_id = ? AND pr.status = 'OPEN'
            ORDER BY pr.pull_request_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(op_err("find_open_pr_ids_by_reviewer"))
    }

    async fn find_short_by_reviewer(
        &self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, AppError> {
        sqlx::query_as::<_, PullRequestShort>(
            r#"
            SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
            FROM pull_requests pr
            INNER JOIN pull_request_reviewers r ON r.pull_request_id = pr.pull_request_id
            WHERE r.user_id = ?
            ORDER BY pr.pull_request_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(op_err("find_short_by_reviewer"))
    }

    async fn stats(&self) -> Result<Stats, AppError> {
        let by_status: Vec<(PullRequestStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM pull_requests GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(op_err("stats"))?;

        let mut stats = Stats::default();
        for (status, count) in by_status {
            stats.total_pr += count;
            match status {
                PullRequestStatus::Open => stats.open_pr = count,
                PullRequestStatus::Merged => stats.merged_pr = count,
            }
        }

        stats.reviewers = sqlx::query_as::<_, ReviewerStat>(
            r#"
            SELECT user_id, COUNT(*) AS count
            FROM pull_request_reviewers
            GROUP BY user_id
            ORDER BY user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(op_err("stats"))?;

        Ok(stats)
    }
}
