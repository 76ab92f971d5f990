//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler can produce maps onto one variant, and each variant maps onto
//! exactly one HTTP status. "Who are you" failures are `Unauthorized` (401) and
//! "you can't do that" failures are `Forbidden` (403); the two are never merged.
//!
//! `AppError` implements `actix_web::error::ResponseError` so handlers can return
//! `Result<_, AppError>` and let Actix Web render the JSON error body. `From`
//! implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `redis::RedisError`
//! allow propagation with the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::validation::collect_messages;

/// Generic body returned for every 5xx so driver details never reach clients.
const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed, expired or revoked credentials (HTTP 401).
    Unauthorized(String),
    /// Authenticated, but not allowed to perform the operation (HTTP 403).
    Forbidden(String),
    /// Malformed request that is not a field-level validation failure (HTTP 400).
    BadRequest(String),
    /// Duplicate username or email (HTTP 400).
    Conflict(String),
    /// The requested resource does not exist (HTTP 404).
    NotFound(String),
    /// One or more field-level validation failures (HTTP 400).
    /// All messages are reported together.
    ValidationError(Vec<String>),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Failure reported by the persistence layer (HTTP 500).
    DatabaseError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ValidationError(msgs) => write!(f, "Validation Error: {}", msgs.join("; ")),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Client errors carry `{"error": <message>}`, validation failures carry
/// `{"errors": [<messages>]}`. Server errors are logged here and answered with a
/// generic message.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::Conflict(_) | AppError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg) => HttpResponse::build(status).json(json!({
                "error": msg
            })),
            AppError::ValidationError(msgs) => HttpResponse::build(status).json(json!({
                "errors": msgs
            })),
            AppError::InternalServerError(msg) | AppError::DatabaseError(msg) => {
                log::error!("{}", msg);
                HttpResponse::build(status).json(json!({
                    "error": INTERNAL_ERROR_MESSAGE
                }))
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound` and unique-constraint violations become
/// `Conflict`; everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let message = match db_err.constraint() {
                    Some(c) if c.contains("email") => "Email exists",
                    _ => "Username exists",
                };
                AppError::Conflict(message.into())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`,
/// keeping every message.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::ValidationError(collect_messages(&errors))
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(format!("Invalid token: {:?}", error.kind()))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Password hashing failed: {}", error))
    }
}

/// Converts `redis::RedisError` into `AppError::InternalServerError`.
impl From<redis::RedisError> for AppError {
    fn from(error: redis::RedisError) -> AppError {
        AppError::InternalServerError(format!("Revocation store failure: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(error: AppError) -> serde_json::Value {
        let response = error.error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::Forbidden("Access denied".into());
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::BadRequest("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::Conflict("Username exists".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Resource not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::ValidationError(vec!["Title is required".into()]);
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::DatabaseError("connection reset".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_validation_error_lists_every_message() {
        let json = body_json(AppError::ValidationError(vec![
            "first".into(),
            "second".into(),
        ]))
        .await;
        assert_eq!(json, json!({ "errors": ["first", "second"] }));
    }

    #[actix_rt::test]
    async fn test_internal_errors_hide_details() {
        let json = body_json(AppError::DatabaseError(
            "relation \"users\" does not exist".into(),
        ))
        .await;
        assert_eq!(json, json!({ "error": INTERNAL_ERROR_MESSAGE }));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::NotFound(_)
        ));
    }
}
