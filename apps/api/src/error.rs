//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  Handler -> Result<T, ApiError>                                        │
//! │         │                                                               │
//! │         ├── DbError::NotFound ──────────────┐                          │
//! │         ├── CoreError::InsufficientStock ───┼──► ApiError              │
//! │         ├── Token / role check ─────────────┘        │                  │
//! │         │                                            ▼                  │
//! │         │                                  IntoResponse:               │
//! │         │                                  status + JSON body          │
//! │         ▼                                                               │
//! │  Client sees:                                                           │
//! │    HTTP/1.1 400 Bad Request                                             │
//! │    { "error": "Insufficient stock for Milk 1L: ...",                    │
//! │      "code": "INSUFFICIENT_STOCK" }                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Database and internal failures are logged in full and reported to the
//! client with a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stockroom_core::CoreError;
use stockroom_db::DbError;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "error": "Product not found: 6f1c...",
///   "code": "NOT_FOUND"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Human-readable error message for display
    #[serde(rename = "error")]
    pub message: String,

    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Sale line references a product that does not exist (400)
    UnknownProduct,

    /// Sale exceeds stock on hand (400)
    InsufficientStock,

    /// Unique value already taken (400)
    Duplicate,

    /// Unknown user or wrong password (400)
    InvalidCredentials,

    /// No bearer token supplied (401)
    MissingToken,

    /// Token malformed, tampered or expired (401)
    InvalidToken,

    /// Authenticated but role not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::UnknownProduct
            | ErrorCode::InsufficientStock
            | ErrorCode::Duplicate
            | ErrorCode::InvalidCredentials => StatusCode::BAD_REQUEST,
            ErrorCode::MissingToken | ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn missing_token() -> Self {
        ApiError::new(ErrorCode::MissingToken, "Missing token")
    }

    pub fn invalid_token() -> Self {
        ApiError::new(ErrorCode::InvalidToken, "Invalid token")
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "Insufficient role")
    }

    pub fn invalid_credentials() -> Self {
        ApiError::new(ErrorCode::InvalidCredentials, "Invalid credentials")
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{field} '{value}' already exists"),
            ),
            DbError::Core(e) => e.into(),
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database busy, try again")
            }
            DbError::ConnectionFailed(e) | DbError::MigrationFailed(e) => {
                tracing::error!(error = %e, "Database unavailable");
                ApiError::new(ErrorCode::DatabaseError, "Database unavailable")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) => ErrorCode::UnknownProduct,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptySale | CoreError::AmountOverflow { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
        };
        ApiError::new(code, err.to_string())
    }
}

/// Malformed or mistyped JSON bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let stock: ApiError = CoreError::InsufficientStock {
            product_id: "p".to_string(),
            name: "Milk".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(stock.status(), StatusCode::BAD_REQUEST);
        assert_eq!(stock.code, ErrorCode::InsufficientStock);

        let missing: ApiError = DbError::not_found("Product", "abc").into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message, "Product not found: abc");

        let duplicate: ApiError = DbError::duplicate("username", "alice").into();
        assert_eq!(duplicate.status(), StatusCode::BAD_REQUEST);

        assert_eq!(ApiError::missing_token().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err: ApiError = DbError::QueryFailed("no such table: secrets".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secrets"));
    }

    #[test]
    fn test_body_shape() {
        let body = serde_json::to_value(ApiError::invalid_token()).unwrap();
        assert_eq!(body["error"], "Invalid token");
        assert_eq!(body["code"], "INVALID_TOKEN");
    }
}
