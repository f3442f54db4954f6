//! Collaborator interfaces consumed by the assignment engine.
//!
//! The engine only talks to storage through these traits, so it can run
//! against SQLite in production and against test doubles in unit tests.

pub mod clock;
pub mod directory;
pub mod pr_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::directory::Directory;
pub use self::pr_store::PullRequestStore;
