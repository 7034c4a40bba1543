use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::generation::GenerationError;
use crate::github::GitHubError;

/// Errors surfaced by HTTP handlers, rendered as `{"error": "..."}`
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthenticated,
    #[error("A GitHub connection is required to analyze repositories.")]
    MissingCredential,
    #[error("You do not have permission to view this document")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::MissingCredential | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Generation(e) => match e {
                GenerationError::SafetyBlocked(_) => StatusCode::BAD_REQUEST,
                GenerationError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
                GenerationError::EmptyResponse => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::GitHub(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Generation(e) => match e {
                GenerationError::SafetyBlocked(_) => {
                    "Content was blocked by safety filters. Please modify your input.".to_string()
                }
                GenerationError::QuotaExceeded(_) => {
                    "AI service quota exceeded. Please try again later.".to_string()
                }
                GenerationError::ModelUnconfigured => {
                    "Documentation generation is not configured on this server".to_string()
                }
                other => format!("Failed to generate documentation: {}", other),
            },
            AppError::GitHub(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(e).context("Database error"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        let body = serde_json::json!({ "error": self.message() });
        (status, Json(body)).into_response()
    }
}
