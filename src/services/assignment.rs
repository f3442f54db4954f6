//! Reviewer assignment engine.
//!
//! Orchestrates pull request creation, merging, single-reviewer
//! reassignment and the bulk deactivation cascade on top of the
//! [`Directory`] and [`PullRequestStore`] ports.
//!
//! The engine holds no state of its own besides the injected random
//! generator. Every reviewer-set write goes through an atomic conditional
//! store operation; reads that precede it are advisory, so concurrent
//! callers get "last swap wins" semantics rather than serializable ones.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{resource, AppError};
use crate::models::{PullRequest, User};
use crate::ports::{Clock, Directory, PullRequestStore, SystemClock};
use crate::services::selector::{pick_one, select_reviewers, REVIEWER_QUOTA};

/// Result of replacing one reviewer on a pull request.
#[derive(Debug, Clone, Serialize)]
pub struct Reassignment {
    pub pull_request: PullRequest,
    pub replaced_by: String,
}

/// Outcome of a bulk deactivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationReport {
    pub team_name: String,
    /// Users actually deactivated, in processing order.
    pub deactivated: Vec<String>,
    pub reassigned_count: usize,
    pub removed_count: usize,
}

impl DeactivationReport {
    fn new(team_name: &str) -> Self {
        Self {
            team_name: team_name.to_string(),
            ..Self::default()
        }
    }
}

/// What happened to one open pull request during a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CascadeOutcome {
    Reassigned,
    Removed,
    /// Merged, gone, or the slot was already changed by someone else.
    Skipped,
}

/// Picks and maintains reviewers for pull requests.
pub struct AssignmentEngine {
    directory: Arc<dyn Directory>,
    store: Arc<dyn PullRequestStore>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
}

impl AssignmentEngine {
    /// Create an engine using wall-clock time and an entropy-seeded generator.
    pub fn new(directory: Arc<dyn Directory>, store: Arc<dyn PullRequestStore>) -> Self {
        Self {
            directory,
            store,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the random generator, e.g. with `StdRng::seed_from_u64`.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Run a pure selection step with exclusive access to the generator.
    ///
    /// Never call this across an `.await`.
    fn with_locked_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }

    fn pick_replacement(&self, candidates: &[User]) -> Option<String> {
        self.with_locked_rng(|rng| pick_one(candidates, rng).map(|u| u.user_id.clone()))
    }

    /// Open a pull request and assign up to two reviewers from the author's team.
    pub async fn create_pull_request(
        &self,
        pr_id: &str,
        pr_name: &str,
        author_id: &str,
    ) -> Result<PullRequest, AppError> {
        require_non_empty(pr_id, "pull_request_id")?;
        require_non_empty(pr_name, "pull_request_name")?;
        require_non_empty(author_id, "author_id")?;

        if self.store.get_with_reviewers(pr_id).await?.is_some() {
            return Err(AppError::already_exists(resource::PULL_REQUEST, pr_id));
        }

        let author = self
            .directory
            .get_user(author_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::AUTHOR, author_id))?;

        let candidates = self
            .directory
            .find_active_team_members_except(&author.team_name, &[author.user_id.clone()])
            .await?;

        let mut reviewers =
            self.with_locked_rng(|rng| select_reviewers(&candidates, REVIEWER_QUOTA, rng));
        reviewers.sort();

        log::debug!(
            "[assignment] {} candidates in team {} for {}, picked {:?}",
            candidates.len(),
            author.team_name,
            pr_id,
            reviewers
        );

        let pr = PullRequest::open(pr_id, pr_name, author_id, reviewers, self.clock.now());
        self.store.create(&pr).await?;

        log::info!(
            "[assignment] Created {} by {} with reviewers {:?}",
            pr.pull_request_id,
            pr.author_id,
            pr.assigned_reviewers
        );

        Ok(pr)
    }

    /// Merge a pull request. Repeated calls return the state of the first merge.
    pub async fn merge_pull_request(&self, pr_id: &str) -> Result<PullRequest, AppError> {
        require_non_empty(pr_id, "pull_request_id")?;

        let pr = self
            .store
            .merge_if_open(pr_id, self.clock.now())
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::PULL_REQUEST, pr_id))?;

        log::info!("[assignment] {} is merged (at {:?})", pr.pull_request_id, pr.merged_at);

        Ok(pr)
    }

    /// Replace `old_reviewer_id` on an open pull request with a random active
    /// teammate of the old reviewer.
    ///
    /// The reviewer count stays the same; the set is not topped up to the quota.
    pub async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        require_non_empty(pr_id, "pull_request_id")?;
        require_non_empty(old_reviewer_id, "old_user_id")?;

        let pr = self
            .store
            .get_with_reviewers(pr_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::PULL_REQUEST, pr_id))?;

        if pr.is_merged() {
            return Err(AppError::already_merged(pr_id));
        }

        if !pr.has_reviewer(old_reviewer_id) {
            return Err(AppError::reviewer_not_assigned(pr_id, old_reviewer_id));
        }

        let old_reviewer = self
            .directory
            .get_user(old_reviewer_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::USER, old_reviewer_id))?;

        let excluded = exclusion_set(&pr, &[]);
        let candidates = self
            .directory
            .find_active_team_members_except(&old_reviewer.team_name, &excluded)
            .await?;

        let replacement = self
            .pick_replacement(&candidates)
            .ok_or_else(|| AppError::no_candidate(pr_id))?;

        self.store
            .swap_reviewer(pr_id, old_reviewer_id, &replacement)
            .await?;

        let updated = self
            .store
            .get_with_reviewers(pr_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::PULL_REQUEST, pr_id))?;

        log::info!(
            "[assignment] {}: reviewer {} replaced by {}",
            pr_id,
            old_reviewer_id,
            replacement
        );

        Ok(Reassignment {
            pull_request: updated,
            replaced_by: replacement,
        })
    }

    /// Deactivate team members and re-resolve every open pull request they review.
    ///
    /// Each user is an independent unit of work: a failure aborts the call,
    /// but deactivations and swaps committed for earlier users stay in place.
    pub async fn deactivate_team_members(
        &self,
        team_name: &str,
        user_ids: &[String],
    ) -> Result<DeactivationReport, AppError> {
        let mut report = DeactivationReport::new(team_name);
        if user_ids.is_empty() {
            return Ok(report);
        }

        require_non_empty(team_name, "team_name")?;

        if !self.directory.team_exists(team_name).await? {
            return Err(AppError::not_found_with_id(resource::TEAM, team_name));
        }

        let batch = dedup_preserving_order(user_ids);

        for (processed, user_id) in batch.iter().enumerate() {
            if let Err(err) = self
                .deactivate_one(team_name, user_id, &batch, &mut report)
                .await
            {
                log::warn!(
                    "[assignment] Deactivation in {} stopped at {} after {}/{} users \
                     (deactivated {:?}, reassigned {}, removed {}): {}",
                    team_name,
                    user_id,
                    processed,
                    batch.len(),
                    report.deactivated,
                    report.reassigned_count,
                    report.removed_count,
                    err
                );
                return Err(err);
            }
        }

        log::info!(
            "[assignment] Deactivated {:?} in {}: {} reassigned, {} removed",
            report.deactivated,
            team_name,
            report.reassigned_count,
            report.removed_count
        );

        Ok(report)
    }

    async fn deactivate_one(
        &self,
        team_name: &str,
        user_id: &str,
        batch: &[String],
        report: &mut DeactivationReport,
    ) -> Result<(), AppError> {
        let user = self
            .directory
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::USER, user_id))?;

        if user.team_name != team_name {
            log::debug!(
                "[assignment] Skipping {}: member of {}, not {}",
                user_id,
                user.team_name,
                team_name
            );
            return Ok(());
        }

        self.directory
            .set_active(user_id, false)
            .await?
            .ok_or_else(|| AppError::not_found_with_id(resource::USER, user_id))?;
        report.deactivated.push(user_id.to_string());

        for pr_id in self.store.find_open_pr_ids_by_reviewer(user_id).await? {
            match self.cascade_pull_request(team_name, &pr_id, user_id, batch).await? {
                CascadeOutcome::Reassigned => report.reassigned_count += 1,
                CascadeOutcome::Removed => report.removed_count += 1,
                CascadeOutcome::Skipped => {}
            }
        }

        Ok(())
    }

    async fn cascade_pull_request(
        &self,
        team_name: &str,
        pr_id: &str,
        reviewer_id: &str,
        batch: &[String],
    ) -> Result<CascadeOutcome, AppError> {
        // Re-read: the PR may have been merged since the id lookup.
        let pr = match self.store.get_with_reviewers(pr_id).await? {
            Some(pr) if !pr.is_merged() && pr.has_reviewer(reviewer_id) => pr,
            _ => return Ok(CascadeOutcome::Skipped),
        };

        let excluded = exclusion_set(&pr, batch);
        let candidates = self
            .directory
            .find_active_team_members_except(team_name, &excluded)
            .await?;

        let (write, outcome) = match self.pick_replacement(&candidates) {
            Some(replacement) => {
                log::debug!(
                    "[assignment] {}: {} -> {}",
                    pr_id,
                    reviewer_id,
                    replacement
                );
                (
                    self.store
                        .swap_reviewer(pr_id, reviewer_id, &replacement)
                        .await,
                    CascadeOutcome::Reassigned,
                )
            }
            None => {
                log::debug!("[assignment] {}: no candidate, dropping {}", pr_id, reviewer_id);
                (
                    self.store.remove_reviewer(pr_id, reviewer_id).await,
                    CascadeOutcome::Removed,
                )
            }
        };

        match write {
            Ok(()) => Ok(outcome),
            // Lost a race with a merge or another swap; the PR is no longer ours to touch.
            Err(AppError::AlreadyMerged { .. })
            | Err(AppError::ReviewerNotAssigned { .. })
            | Err(AppError::ReviewerAlreadyAssigned { .. }) => {
                log::debug!(
                    "[assignment] {}: lost a write race for {}, skipping",
                    pr_id,
                    reviewer_id
                );
                Ok(CascadeOutcome::Skipped)
            }
            Err(err) if err.is_not_found_of(resource::PULL_REQUEST) => Ok(CascadeOutcome::Skipped),
            Err(err) => Err(err),
        }
    }
}

/// Author, current reviewers and `extra` ids, none of whom may be picked.
fn exclusion_set(pr: &PullRequest, extra: &[String]) -> Vec<String> {
    let mut excluded = Vec::with_capacity(1 + pr.assigned_reviewers.len() + extra.len());
    excluded.push(pr.author_id.clone());
    excluded.extend(pr.assigned_reviewers.iter().cloned());
    excluded.extend(extra.iter().cloned());
    excluded
}

fn dedup_preserving_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_input_field(
            format!("{} is required", field),
            field,
        ));
    }
    Ok(())
}
