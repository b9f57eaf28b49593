use axum::http::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::event::HandlerResponse;

/// Failures reported by a [`MarketStore`](crate::store::MarketStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,
    #[error("timed out waiting for a store connection")]
    Timeout,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::ForeignKeyViolation
            }
            _ => StoreError::Database(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid email or password")]
    Authentication,
    #[error("Unknown action")]
    UnknownAction,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Conflict(String),
    #[error("Request body too large")]
    PayloadTooLarge,
    #[error("internal server error")]
    Credential(String),
    #[error("internal server error")]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::UnknownAction => StatusCode::BAD_REQUEST,
            ApiError::Authentication => StatusCode::UNAUTHORIZED,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Credential(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Authentication => "authentication",
            ApiError::UnknownAction => "unknown_action",
            ApiError::MethodNotAllowed => "method_not_allowed",
            ApiError::Conflict(_) => "conflict",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::Credential(_) => "internal",
            ApiError::Store(_) => "store",
        }
    }

    pub fn into_handler_response(self) -> HandlerResponse {
        match &self {
            ApiError::Store(inner) => error!(error = %inner, "store failure"),
            ApiError::Credential(detail) => error!(error = %detail, "credential hashing failure"),
            _ => {}
        }
        HandlerResponse::json(
            self.status(),
            &json!({ "error": self.to_string(), "kind": self.kind() }),
        )
    }
}
