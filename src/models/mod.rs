//! Data models for the application.
//!
//! These models represent the core entities stored in the SQLite database
//! and returned over the HTTP API.
//!
//! Row-backed models derive Serialize for JSON responses and FromRow for SQLx queries.

pub mod pull_request;
pub mod stats;
pub mod team;
pub mod user;

// Re-exports for convenient access
pub use pull_request::{PullRequest, PullRequestShort, PullRequestStatus};
pub use stats::{ReviewerStat, Stats};
pub use team::{Team, TeamMember};
pub use user::User;
