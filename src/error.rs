//!
//! # Custom Error Handling
//!
//! This module defines the `AppError` type returned by every store operation,
//! policy decision and request handler in the service.
//!
//! `AppError` implements `actix_web::error::ResponseError`, so handlers can return
//! it directly and the client always receives a `{"error": <message>}` body with
//! the status code that encodes the class of failure. Datastore and other
//! unexpected failures are logged here, at the boundary, and surfaced with a
//! generic message so no internal detail reaches the response body.

use actix_web::{
    error::{BlockingError, ResponseError},
    http::{header, StatusCode},
    HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Seconds a client is asked to wait after the connection pool was exhausted.
const RETRY_AFTER_SECS: &str = "1";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid credentials (HTTP 401).
    Unauthorized(String),
    /// The caller is authenticated but its role is insufficient (HTTP 403).
    Forbidden(String),
    /// Malformed request: bad JSON, unknown fields, bad query string (HTTP 400).
    BadRequest(String),
    /// Input was well-formed but failed a content rule, e.g. an empty task name (HTTP 400).
    ValidationError(String),
    /// A uniqueness rule was violated, e.g. a taken username.
    /// Reported as HTTP 400 to stay compatible with existing clients.
    Conflict(String),
    /// No row matched the requested id (HTTP 404).
    NotFound(String),
    /// The connection pool could not hand out a connection in time (HTTP 503).
    /// The request may be retried.
    ServiceUnavailable(String),
    /// Any other datastore failure (HTTP 500). The message is only logged.
    DatabaseError(String),
    /// Unexpected server-side failure (HTTP 500). The message is only logged.
    InternalServerError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) | AppError::ValidationError(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::ValidationError(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg) => msg.as_str(),
            AppError::ServiceUnavailable(detail) => {
                log::warn!("Datastore unavailable: {}", detail);
                "Service temporarily unavailable"
            }
            AppError::DatabaseError(detail) => {
                log::error!("Database error: {}", detail);
                "Internal server error"
            }
            AppError::InternalServerError(detail) => {
                log::error!("Internal error: {}", detail);
                "Internal server error"
            }
        };

        let mut response = HttpResponse::build(self.status_code());
        if let AppError::ServiceUnavailable(_) = self {
            response.insert_header((header::RETRY_AFTER, RETRY_AFTER_SECS));
        }
        response.json(json!({ "error": message }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Pool exhaustion becomes a retryable `ServiceUnavailable`; `RowNotFound` maps to
/// `NotFound`; everything else is an opaque `DatabaseError`. Unique violations are
/// translated by the store that issued the insert, because only it knows which
/// constraint it was relying on.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                AppError::ServiceUnavailable(error.to_string())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `jsonwebtoken::errors::Error` into `AppError::Unauthorized`.
///
/// The client only ever sees "Invalid token"; the reason is logged at debug level.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        log::debug!("Token rejected: {}", error);
        AppError::Unauthorized("Invalid token".into())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Password hashing failed: {}", error))
    }
}

/// A blocking task (password hashing) was cancelled or panicked.
impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
