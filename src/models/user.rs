//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A team member who can author and review pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,

    /// Display name.
    pub username: String,

    /// The single team this user belongs to.
    pub team_name: String,

    /// Only active users are eligible reviewer candidates.
    pub is_active: bool,
}

impl User {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        team_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active,
        }
    }
}
