use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::policy::Denial;

/// AppError
///
/// The single error type raised by the service layer, the extractors and the repository.
/// Each variant maps to exactly one HTTP status; the `error` label in the response body is
/// stable per kind so clients can branch on it, while `message` is for humans.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input: bad JSON, unknown fields, failed validation rules, bad path ids.
    #[error("{0}")]
    Validation(String),
    /// Missing, malformed, tampered or expired credentials.
    #[error("{0}")]
    Authentication(String),
    /// The policy engine denied the action.
    #[error("{0}")]
    Authorization(Denial),
    #[error("{message}")]
    NotFound { error: &'static str, message: String },
    /// Duplicate email.
    #[error("{0}")]
    Conflict(String),
    /// Anything unexpected. The message is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

/// ErrorResponse
///
/// The stable JSON payload for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    pub fn invalid_credentials() -> Self {
        Self::Authentication("Invalid credentials".to_string())
    }

    pub fn user_not_found() -> Self {
        Self::NotFound {
            error: "User not found",
            message: "The requested user does not exist".to_string(),
        }
    }

    pub fn route_not_found(path: &str) -> Self {
        Self::NotFound {
            error: "Resource not found",
            message: format!("No route matches {path}"),
        }
    }

    pub fn email_conflict() -> Self {
        Self::Conflict("This email address is already in use".to_string())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The stable, machine-facing label written to the `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation failed",
            Self::Authentication(_) => "Authentication failed",
            Self::Authorization(denial) => denial.label(),
            Self::NotFound { error, .. } => *error,
            Self::Conflict(_) => "Email conflict",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl From<ValidationErrors> for AppError {
    /// Flattens every rule failure into one comma-separated message, sorted so the
    /// output does not depend on hash map ordering.
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();

        if messages.is_empty() {
            return Self::Validation("Validation failed".to_string());
        }
        Self::Validation(messages.join(","))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::email_conflict(),
            _ => Self::Internal(format!("database error: {err}")),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Internal(format!("token error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Internal server error");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: self.label().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
