use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, DishError, OrderError};

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    Unauthorized(String),

    Forbidden(String),

    NotFound(String),

    Conflict(String),

    DependencyFailure(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DependencyFailure(msg) => write!(f, "Dependency failure: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::DependencyFailure(msg) => {
                tracing::warn!("Dependency failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "An upstream service is unavailable".to_string(),
                )
            }
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => ApiError::Conflict(err.to_string()),
            AuthError::InvalidCredentials
            | AuthError::MissingCredential
            | AuthError::InvalidToken
            | AuthError::StalePassword
            | AuthError::UserGone => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidOrExpiredToken | AuthError::Validation(_) => {
                ApiError::ValidationError(err.to_string())
            }
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::NotificationFailed(msg) => ApiError::DependencyFailure(msg),
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<DishError> for ApiError {
    fn from(err: DishError) -> Self {
        match err {
            DishError::NotFound => ApiError::NotFound(err.to_string()),
            DishError::NameTaken => ApiError::Conflict(err.to_string()),
            DishError::Validation(_) => ApiError::ValidationError(err.to_string()),
            DishError::Database(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound => ApiError::NotFound(err.to_string()),
            OrderError::DishNotFound(_) => ApiError::NotFound(err.to_string()),
            OrderError::InvalidSchedule(_)
            | OrderError::MissingLocation
            | OrderError::Validation(_) => ApiError::ValidationError(err.to_string()),
            OrderError::Database(msg) => ApiError::DatabaseError(msg),
            OrderError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("You do not have permission to perform this action".to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
