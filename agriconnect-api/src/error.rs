/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts into the
/// appropriate status code.
///
/// # Taxonomy
///
/// | Variant      | Status | Meaning                                     |
/// |--------------|--------|---------------------------------------------|
/// | Validation   | 400    | Malformed, missing, or out-of-range input   |
/// | NotAvailable | 400    | Equipment missing or not active             |
/// | BadRequest   | 400    | Other caller mistakes                       |
/// | Unauthorized | 401    | Missing or invalid credentials              |
/// | Forbidden    | 403    | Authenticated but not allowed               |
/// | NotFound     | 404    | Missing entity                              |
/// | Conflict     | 422    | Overlapping reservation, duplicate email    |
/// | Internal     | 500    | Everything else (message logged, not leaked)|
///
/// Every failure is detected synchronously and returned immediately;
/// nothing is retried or queued.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use agriconnect_shared::auth::jwt::JwtError;
use agriconnect_shared::auth::password::PasswordError;
use agriconnect_shared::models::reservation::ReservationError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Input validation failed (400)
    Validation(Vec<ValidationErrorDetail>),

    /// Equipment missing or not open for reservation (400)
    NotAvailable(String),

    /// Other bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (422) - overlapping reservation, duplicate email
    Conflict(String),

    /// Internal server error (500)
    Internal(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_error", "conflict")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::NotAvailable(msg) => write!(f, "Not available: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Convenience constructor for a single-field validation error
    pub fn validation(field: &str, message: &str) -> Self {
        ApiError::Validation(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::NotAvailable(msg) => (StatusCode::BAD_REQUEST, "not_available", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "conflict", msg, None),
            ApiError::Internal(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    if constraint.contains("no_overlapping_active_reservations") {
                        return ApiError::Conflict(
                            "Equipment is already reserved for the selected period.".to_string(),
                        );
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert booking errors to API errors
impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::StartDateInPast => {
                ApiError::validation("start_date", "The start date must be today or later")
            }
            ReservationError::EndDateNotAfterStart => {
                ApiError::validation("end_date", "The end date must be after the start date")
            }
            ReservationError::NotAvailable => {
                ApiError::NotAvailable("Equipment not available for reservation".to_string())
            }
            ReservationError::Overlap => ApiError::Conflict(
                "Equipment is already reserved for the selected period.".to_string(),
            ),
            ReservationError::Database(db) => db.into(),
        }
    }
}

/// Convert request validation errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::Validation(details)
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");

        let err = ApiError::NotAvailable("Equipment not available".to_string());
        assert_eq!(err.to_string(), "Not available: Equipment not available");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ApiError::Validation(vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_reservation_error_mapping() {
        let err: ApiError = ReservationError::Overlap.into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = ReservationError::NotAvailable.into();
        assert!(matches!(err, ApiError::NotAvailable(_)));

        let err: ApiError = ReservationError::StartDateInPast.into();
        match err {
            ApiError::Validation(details) => assert_eq!(details[0].field, "start_date"),
            other => panic!("Expected validation error, got {:?}", other),
        }

        let err: ApiError = ReservationError::EndDateNotAfterStart.into();
        match err {
            ApiError::Validation(details) => assert_eq!(details[0].field, "end_date"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_status_codes() {
        use axum::response::IntoResponse;

        let cases: Vec<(ApiError, StatusCode)> = vec![
            (
                ApiError::validation("f", "m"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::NotAvailable("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("x".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ApiError::Conflict("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
