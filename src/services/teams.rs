//! Team management.

use std::sync::Arc;

use crate::error::{resource, AppError};
use crate::models::{Team, TeamMember, User};
use crate::ports::Directory;

/// Creates teams and reads them back with their members.
#[derive(Clone)]
pub struct TeamService {
    directory: Arc<dyn Directory>,
}

impl TeamService {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Create a team and upsert its members.
    ///
    /// Existing users listed as members are moved into the new team and get
    /// their username and active flag overwritten.
    pub async fn add_team(
        &self,
        team_name: &str,
        members: Vec<TeamMember>,
    ) -> Result<Team, AppError> {
        if team_name.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "team_name is required",
                "team_name",
            ));
        }
        if let Some(blank) = members.iter().find(|m| m.user_id.trim().is_empty()) {
            return Err(AppError::invalid_input_field(
                format!("member user_id is required (username {:?})", blank.username),
                "members",
            ));
        }

        self.directory.create_team(team_name).await?;

        let users: Vec<User> = members
            .iter()
            .cloned()
            .map(|m| m.into_user(team_name))
            .collect();
        self.directory.upsert_team_members(team_name, &users).await?;

        log::info!(
            "[teams] Created team {} with {} members",
            team_name,
            members.len()
        );

        Ok(Team {
            team_name: team_name.to_string(),
            members,
        })
    }

    pub async fn get_team(&self, team_name: &str) -> Result<Team, AppError> {
        self.directory
            .get_team_with_members(team_name)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::TEAM, team_name))
    }
}
