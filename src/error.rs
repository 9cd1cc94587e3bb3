//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler, service or store can produce is expressed as one of its
//! variants, and `AppError` implements `actix_web::error::ResponseError` so that it is
//! rendered as the standard `{ success: false, message, errors? }` JSON envelope.
//!
//! Internal failures (database, hashing, task joins) are logged in full but reach the
//! client only as a generic "Internal server error".
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `tokio::task::JoinError`
//! allow the `?` operator to be used everywhere.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::fmt;
use validator::ValidationErrors;

/// Convenience alias used by services and stores.
pub type AppResult<T> = Result<T, AppError>;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// Unique index on `lower(users.email)`.
const USERS_EMAIL_INDEX: &str = "users_email_lower_idx";

/// A single input problem, reported back to the client next to the field it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Missing, malformed or expired credentials (HTTP 401).
    Unauthorized(String),
    /// The resource does not exist or is not owned by the caller (HTTP 404).
    NotFound(String),
    /// A unique field (the user's email) is already taken (HTTP 409).
    Conflict(String),
    /// Input rejected before any business logic ran (HTTP 400).
    ValidationError(Vec<FieldViolation>),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Failure reported by the database driver (HTTP 500).
    DatabaseError(String),
}

impl AppError {
    /// Shorthand for a validation error on a single field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::ValidationError(vec![FieldViolation::new(field, message)])
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::ValidationError(violations) => {
                write!(f, "Validation Error: ")?;
                let parts: Vec<String> = violations
                    .iter()
                    .map(|v| format!("{}: {}", v.field, v.message))
                    .collect();
                write!(f, "{}", parts.join(", "))
            }
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldViolation]>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Unauthorized(msg) | AppError::NotFound(msg) | AppError::Conflict(msg) => {
                ErrorBody {
                    success: false,
                    message: msg,
                    errors: None,
                }
            }
            AppError::ValidationError(violations) => ErrorBody {
                success: false,
                message: "Validation failed",
                errors: Some(violations),
            },
            // Details stay in the server log.
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                log::error!("{}", self);
                ErrorBody {
                    success: false,
                    message: "Internal server error",
                    errors: None,
                }
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Maps a unique violation to a client error when the constraint is one a client can hit.
fn unique_violation(constraint: Option<&str>, detail: String) -> AppError {
    match constraint {
        Some(USERS_EMAIL_INDEX) => AppError::Conflict("User with this email already exists".into()),
        _ => AppError::DatabaseError(detail),
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// Only a violation of the users' email index is a `Conflict`. Everything else,
/// including a refresh-token hash collision, is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                unique_violation(db_err.constraint(), error.to_string())
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// Field names are reported in the camelCase used on the wire and sorted so the
/// output is stable.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", camel_case(field)));
                    FieldViolation::new(camel_case(field), message)
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationError(violations)
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
        AppError::InternalServerError(error.to_string())
    }
}

/// A panicked or cancelled blocking task (password hashing) is an internal failure.
impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> AppError {
        AppError::InternalServerError(format!("Background task failed: {}", error))
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::invalid("title", "Title is required");
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Task not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::Conflict("User with this email already exists".into());
        assert_eq!(error.error_response().status(), 409);

        let error = AppError::InternalServerError("Server error".into());
        assert_eq!(error.error_response().status(), 500);

        let error = AppError::DatabaseError("connection reset".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[actix_rt::test]
    async fn test_internal_details_are_not_leaked() {
        let error = AppError::DatabaseError("relation \"users\" does not exist".into());
        let body = actix_web::body::to_bytes(error.error_response().into_body())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Internal server error");
        assert!(!String::from_utf8_lossy(&body).contains("relation"));
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Refresh token is required"))]
        refresh_token: String,
    }

    #[test]
    fn test_validation_errors_use_wire_field_names() {
        let err: AppError = Sample {
            refresh_token: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();

        match err {
            AppError::ValidationError(violations) => {
                assert_eq!(
                    violations,
                    vec![FieldViolation::new("refreshToken", "Refresh token is required")]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("refresh_token"), "refreshToken");
        assert_eq!(camel_case("email"), "email");
    }

    #[test]
    fn test_only_email_index_violation_is_conflict() {
        let email = unique_violation(Some("users_email_lower_idx"), "dup".into());
        assert!(matches!(email, AppError::Conflict(_)));

        let token = unique_violation(Some("refresh_tokens_token_hash_key"), "dup".into());
        assert!(matches!(token, AppError::DatabaseError(_)));

        assert!(matches!(
            unique_violation(None, "dup".into()),
            AppError::DatabaseError(_)
        ));
    }
}
