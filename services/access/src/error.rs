//! Error types for the access service
//!
//! [`AccessError`] is the taxonomy seen by the resolver and the repositories.
//! [`ApiError`] is what HTTP handlers return.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors raised while reading or writing access records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// No record exists for the user; callers substitute defaults
    #[error("Access record not found")]
    NotFound,

    /// The backend could not be reached or the call failed midway
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered but is not set up the way this service expects
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The caller lacks the capability required for a write
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Rejected payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AccessError {
    /// Classify a database error into the access taxonomy
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AccessError::NotFound,
            sqlx::Error::Configuration(e) => AccessError::Configuration(e.to_string()),
            sqlx::Error::ColumnNotFound(column) => {
                AccessError::Configuration(format!("missing column: {}", column))
            }
            sqlx::Error::Database(e) => Self::from_database_code(e.code().as_deref(), e.message()),
            other => AccessError::Transport(other.to_string()),
        }
    }

    /// Classify a database-reported error by its SQLSTATE code
    fn from_database_code(code: Option<&str>, message: &str) -> Self {
        match code {
            // foreign_key_violation: the user being written does not exist
            Some("23503") => AccessError::NotFound,
            // undefined_table
            Some("42P01") => AccessError::Configuration(message.to_string()),
            _ => AccessError::Transport(message.to_string()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AccessError::NotFound)
    }
}

impl From<DatabaseError> for AccessError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Configuration(msg) => AccessError::Configuration(msg),
            DatabaseError::Connection(e) | DatabaseError::Query(e) => AccessError::from_sqlx(e),
        }
    }
}

/// Type alias for results of access operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Custom error type for the HTTP surface
#[derive(Error, Debug)]
pub enum ApiError {
    /// No authenticated identity on the request
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("Forbidden")]
    Forbidden,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Forbidden(_) => ApiError::Forbidden,
            AccessError::InvalidInput(msg) => ApiError::BadRequest(msg),
            AccessError::NotFound => ApiError::BadRequest("User not found".to_string()),
            other => {
                error!("Access backend failure: {}", other);
                ApiError::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlx_classification() {
        assert_eq!(
            AccessError::from_sqlx(sqlx::Error::RowNotFound),
            AccessError::NotFound
        );
        assert!(matches!(
            AccessError::from_sqlx(sqlx::Error::PoolTimedOut),
            AccessError::Transport(_)
        ));
        assert!(matches!(
            AccessError::from_sqlx(sqlx::Error::ColumnNotFound("roles".into())),
            AccessError::Configuration(_)
        ));
    }

    #[test]
    fn test_database_codes_are_classified() {
        assert_eq!(
            AccessError::from_database_code(Some("23503"), "violates foreign key constraint"),
            AccessError::NotFound
        );
        assert!(matches!(
            AccessError::from_database_code(Some("42P01"), "relation does not exist"),
            AccessError::Configuration(_)
        ));
        assert!(matches!(
            AccessError::from_database_code(Some("40001"), "could not serialize access"),
            AccessError::Transport(_)
        ));
        assert!(matches!(
            AccessError::from_database_code(None, "unknown"),
            AccessError::Transport(_)
        ));
    }

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
            (ApiError::BadRequest("nope".into()), StatusCode::BAD_REQUEST),
            (ApiError::InternalServerError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_access_error_maps_to_api_error() {
        assert!(matches!(
            ApiError::from(AccessError::Forbidden("admin only".into())),
            ApiError::Forbidden
        ));
        assert!(matches!(
            ApiError::from(AccessError::Transport("reset".into())),
            ApiError::InternalServerError
        ));
    }
}
