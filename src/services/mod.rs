//! Business logic services.
//!
//! The assignment engine owns every reviewer-set decision. The remaining
//! services are thin wrappers over the storage ports for team, user and
//! statistics endpoints.
//!
//! Services depend only on the port traits and are independent of axum.

pub mod assignment;
pub mod selector;
pub mod stats;
pub mod teams;
pub mod users;

pub use assignment::{AssignmentEngine, DeactivationReport, Reassignment};
pub use stats::StatsService;
pub use teams::TeamService;
pub use users::UserService;
