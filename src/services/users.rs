//! User activity and review listings.

use std::sync::Arc;

use crate::error::{resource, AppError};
use crate::models::{PullRequestShort, User};
use crate::ports::{Directory, PullRequestStore};

#[derive(Clone)]
pub struct UserService {
    directory: Arc<dyn Directory>,
    store: Arc<dyn PullRequestStore>,
}

impl UserService {
    pub fn new(directory: Arc<dyn Directory>, store: Arc<dyn PullRequestStore>) -> Self {
        Self { directory, store }
    }

    /// Flip a user's active flag.
    ///
    /// Unlike team deactivation this leaves the user's open review slots alone.
    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        let user = self
            .directory
            .set_active(user_id, is_active)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::USER, user_id))?;

        log::info!("[users] {} is_active={}", user.user_id, user.is_active);

        Ok(user)
    }

    /// Pull requests of any status the user reviews, ordered by id.
    pub async fn get_review_prs(&self, user_id: &str) -> Result<Vec<PullRequestShort>, AppError> {
        if self.directory.get_user(user_id).await?.is_none() {
            return Err(AppError::not_found_with_id(resource::USER, user_id));
        }

        self.store.find_short_by_reviewer(user_id).await
    }
}
