//! Review statistics.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::Stats;
use crate::ports::PullRequestStore;

#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn PullRequestStore>,
}

impl StatsService {
    pub fn new(store: Arc<dyn PullRequestStore>) -> Self {
        Self { store }
    }

    pub async fn get_stats(&self) -> Result<Stats, AppError> {
        self.store.stats().await
    }
}
