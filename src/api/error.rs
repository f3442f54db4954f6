//! Mapping of `AppError` onto HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{resource, AppError};

/// JSON error envelope: `{"status":"ERROR","error":{"code","message"}}`.
#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Wrapper to make AppError usable as an axum error response.
#[derive(Debug)]
pub struct ApiErr(pub AppError);

impl ApiErr {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            AppError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::AlreadyExists { resource, .. } if resource == resource::TEAM => {
                (StatusCode::BAD_REQUEST, "TEAM_EXISTS")
            }
            AppError::AlreadyExists { .. } => (StatusCode::CONFLICT, "PR_EXISTS"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::AlreadyMerged { .. } => (StatusCode::CONFLICT, "PR_MERGED"),
            AppError::ReviewerNotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
            AppError::ReviewerAlreadyAssigned { .. } => (StatusCode::CONFLICT, "ALREADY_ASSIGNED"),
            AppError::NoCandidate { .. } => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            AppError::Database { .. } | AppError::Internal { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.0.is_infrastructure() {
            log::error!("[api] {}", self.0);
            "internal server error".to_string()
        } else {
            log::debug!("[api] {} -> {}", code, self.0);
            self.0.to_string()
        };

        (
            status,
            Json(ErrorBody {
                status: "ERROR",
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<AppError> for ApiErr {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiErr {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::invalid_input(rejection.body_text()))
    }
}
