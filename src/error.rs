//! Application error types.
//!
//! Business-rule failures (missing entities, merged pull requests, absent
//! reviewers, empty candidate pools) are typed variants the caller maps to
//! user-visible responses. Storage and other unexpected failures are the
//! opaque infrastructure kind.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by the assignment engine, the
/// services and the storage layer.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Entity with this identity already exists.
    #[error("{resource} already exists: {id}")]
    AlreadyExists { resource: String, id: String },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Pull request is merged and its reviewer set is frozen.
    #[error("Pull request already merged: {pull_request_id}")]
    AlreadyMerged { pull_request_id: String },

    /// The given user is not a reviewer of the pull request.
    #[error("Reviewer {user_id} is not assigned to pull request {pull_request_id}")]
    ReviewerNotAssigned {
        pull_request_id: String,
        user_id: String,
    },

    /// The intended replacement already reviews the pull request.
    #[error("Reviewer {user_id} is already assigned to pull request {pull_request_id}")]
    ReviewerAlreadyAssigned {
        pull_request_id: String,
        user_id: String,
    },

    /// No active team member is eligible as a replacement.
    #[error("No active replacement candidate for pull request {pull_request_id}")]
    NoCandidate { pull_request_id: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Resource names used in `NotFound` / `AlreadyExists` errors.
pub mod resource {
    pub const PULL_REQUEST: &str = "PullRequest";
    pub const USER: &str = "User";
    pub const AUTHOR: &str = "Author";
    pub const TEAM: &str = "Team";
}

impl AppError {
    /// Create an already-exists error.
    pub fn already_exists(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an already-merged error.
    pub fn already_merged(pull_request_id: impl Into<String>) -> Self {
        Self::AlreadyMerged {
            pull_request_id: pull_request_id.into(),
        }
    }

    /// Create a reviewer-not-assigned error.
    pub fn reviewer_not_assigned(
        pull_request_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::ReviewerNotAssigned {
            pull_request_id: pull_request_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Create a reviewer-already-assigned error.
    pub fn reviewer_already_assigned(
        pull_request_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::ReviewerAlreadyAssigned {
            pull_request_id: pull_request_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Create a no-candidate error.
    pub fn no_candidate(pull_request_id: impl Into<String>) -> Self {
        Self::NoCandidate {
            pull_request_id: pull_request_id.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a database error with optional operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach operation context to a database error. Other variants pass through.
    pub fn with_op(self, op: &str) -> Self {
        match self {
            Self::Database {
                message,
                operation: None,
            } => Self::database_with_op(message, op),
            other => other,
        }
    }

    /// Whether this is an opaque infrastructure failure rather than a
    /// business-rule outcome.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::Internal { .. })
    }

    /// Check if this is a not found error for the given resource.
    pub fn is_not_found_of(&self, expected: &str) -> bool {
        matches!(self, Self::NotFound { resource, .. } if resource == expected)
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}
