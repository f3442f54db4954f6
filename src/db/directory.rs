//! SQLite implementation of the user/team directory.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::db::pool::DbPool;
use crate::db::{is_unique_violation, op_err};
use crate::error::{resource, AppError};
use crate::models::{Team, TeamMember, User};
use crate::ports::Directory;

/// Directory backed by the `teams` and `users` tables.
#[derive(Clone)]
pub struct SqliteDirectory {
    pool: DbPool,
}

impl SqliteDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for SqliteDirectory {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, username, team_name, is_active FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(op_err("get_user"))
    }

    async fn find_active_team_members_except(
        &self,
        team_name: &str,
        excluded: &[String],
    ) -> Result<Vec<User>, AppError> {
        let members = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE team_name = ? AND is_active = 1
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await
        .map_err(op_err("find_active_team_members_except"))?;

        let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();

        Ok(members
            .into_iter()
            .filter(|u| !excluded.contains(u.user_id.as_str()))
            .collect())
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = ?, updated_at = strftime('%s', 'now')
            WHERE user_id = ?
            RETURNING user_id, username, team_name, is_active
            "#,
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(op_err("set_active"))
    }

    async fn upsert_team_members(
        &self,
        team_name: &str,
        members: &[User],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(op_err("upsert_team_members"))?;

        for member in members {
            sqlx::query(
                r#"
                INSERT INTO users (user_id, username, team_name, is_active)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(user_id) DO UPDATE SET
                    username = excluded.username,
                    team_name = excluded.team_name,
                    is_active = excluded.is_active,
                    updated_at = strftime('%s', 'now')
                "#,
            )
            .bind(&member.user_id)
            .bind(&member.username)
            .bind(team_name)
            .bind(member.is_active)
            .execute(&mut *tx)
            .await
            .map_err(op_err("upsert_team_members"))?;
        }

        tx.commit().await.map_err(op_err("upsert_team_members"))?;

        Ok(())
    }

    async fn team_exists(&self, team_name: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM teams WHERE team_name = ?")
            .bind(team_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(op_err("team_exists"))?;

        Ok(row.is_some())
    }

    async fn create_team(&self, team_name: &str) -> Result<(), AppError> {
        sqlx::query("INSERT INTO teams (team_name) VALUES (?)")
            .bind(team_name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::already_exists(resource::TEAM, team_name)
                } else {
                    AppError::database_with_op(e.to_string(), "create_team")
                }
            })?;

        Ok(())
    }

    async fn get_team_with_members(&self, team_name: &str) -> Result<Option<Team>, AppError> {
        if !self.team_exists(team_name).await? {
            return Ok(None);
        }

        let members = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, team_name, is_active
            FROM users
            WHERE team_name = ?
            ORDER BY user_id
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await
        .map_err(op_err("get_team_with_members"))?;

        Ok(Some(Team {
            team_name: team_name.to_string(),
            members: members.into_iter().map(TeamMember::from).collect(),
        }))
    }
}
