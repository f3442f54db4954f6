//! Directory port - users and teams.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Team, User};

/// Resolves users and teams and mutates the active flag.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up a user by id.
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError>;

    /// Active members of `team_name` whose id is not in `excluded`, sorted by id.
    async fn find_active_team_members_except(
        &self,
        team_name: &str,
        excluded: &[String],
    ) -> Result<Vec<User>, AppError>;

    /// Set the active flag, returning the updated user (`None` if absent).
    async fn set_active(&self, user_id: &str, is_active: bool) -> Result<Option<User>, AppError>;

    /// Insert or update users as members of `team_name`, in one transaction.
    async fn upsert_team_members(&self, team_name: &str, members: &[User])
        -> Result<(), AppError>;

    async fn team_exists(&self, team_name: &str) -> Result<bool, AppError>;

    /// Create an empty team. Fails with `AlreadyExists` if the name is taken.
    async fn create_team(&self, team_name: &str) -> Result<(), AppError>;

    async fn get_team_with_members(&self, team_name: &str) -> Result<Option<Team>, AppError>;
}
