//! HTTP error taxonomy.
//!
//! This module provides the [`HttpError`] type used by every pipeline stage
//! and handler that detects a client- or server-visible fault, together with
//! the closed [`ErrorCode`] catalog clients can branch on.
//!
//! An `HttpError` is a plain value: constructing one has no side effects.
//! Logging happens once, in the envelope formatter
//! ([`envelope::error`](crate::envelope::error)), never here.
//!
//! # Example
//!
//! ```
//! use palisade_core::{ErrorCode, HttpError};
//!
//! let err = HttpError::not_found("Account");
//! assert_eq!(err.status(), 404);
//! assert_eq!(err.code(), ErrorCode::NotFound);
//! assert_eq!(err.message(), "Account not found");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes exposed on the wire.
///
/// The catalog is closed: every failure a client can observe carries one of
/// these codes, independent of the freeform message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or invalid request.
    BadRequest,
    /// Input failed a semantic check.
    InvalidInput,
    /// Schema validation rejected the request.
    ValidationFailed,
    /// A required parameter was absent.
    MissingParameter,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Credential was present but could not be verified.
    InvalidToken,
    /// Caller is authenticated but not allowed.
    Forbidden,
    /// Caller lacks a required permission.
    InsufficientPermissions,
    /// Resource does not exist.
    NotFound,
    /// State conflict (e.g. duplicate resource).
    Conflict,
    /// Request was well-formed but semantically unprocessable.
    UnprocessableEntity,
    /// Rate limit exceeded.
    TooManyRequests,
    /// Unexpected server fault.
    InternalServerError,
    /// Persistence layer fault.
    DatabaseError,
    /// Status code outside the fixed mapping.
    UnknownError,
}

impl ErrorCode {
    /// Derives the default error code for an HTTP status code.
    ///
    /// Statuses outside the fixed mapping derive to [`ErrorCode::UnknownError`].
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            422 => Self::UnprocessableEntity,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            _ => Self::UnknownError,
        }
    }

    /// Returns the wire representation of this code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A client- or server-visible HTTP fault.
///
/// Immutable once constructed; consumed exactly once by the envelope
/// formatter. Any pipeline stage or handler may create one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct HttpError {
    status: u16,
    code: ErrorCode,
    message: String,
}

impl HttpError {
    /// Creates an error with the code derived from the status.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: ErrorCode::from_status(status),
            message: message.into(),
        }
    }

    /// Creates an error with an explicit code.
    #[must_use]
    pub fn with_code(status: u16, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True for 4xx statuses: expected, recoverable-by-caller conditions.
    #[must_use]
    pub const fn is_client_fault(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    // Convenience constructors for the common cases. Each takes the message
    // the original caller would have written; defaults match the catalog.

    /// 400 `BAD_REQUEST`.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code(400, ErrorCode::BadRequest, message)
    }

    /// 400 `INVALID_INPUT`.
    #[must_use]
    pub fn invalid_input() -> Self {
        Self::with_code(400, ErrorCode::InvalidInput, "Invalid input provided")
    }

    /// 400 `VALIDATION_FAILED`.
    #[must_use]
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::with_code(400, ErrorCode::ValidationFailed, message)
    }

    /// 400 `MISSING_PARAMETER` naming the parameter.
    #[must_use]
    pub fn missing_parameter(name: &str) -> Self {
        Self::with_code(
            400,
            ErrorCode::MissingParameter,
            format!("Missing required parameter: {name}"),
        )
    }

    /// 401 `UNAUTHORIZED`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_code(401, ErrorCode::Unauthorized, message)
    }

    /// 401 `INVALID_TOKEN`.
    #[must_use]
    pub fn invalid_token() -> Self {
        Self::with_code(401, ErrorCode::InvalidToken, "Invalid or expired token")
    }

    /// 403 `FORBIDDEN`.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_code(403, ErrorCode::Forbidden, message)
    }

    /// 403 `INSUFFICIENT_PERMISSIONS`.
    #[must_use]
    pub fn insufficient_permissions() -> Self {
        Self::with_code(
            403,
            ErrorCode::InsufficientPermissions,
            "Insufficient permissions",
        )
    }

    /// 404 `NOT_FOUND` with a `"{resource} not found"` message.
    #[must_use]
    pub fn not_found(resource: &str) -> Self {
        Self::with_code(404, ErrorCode::NotFound, format!("{resource} not found"))
    }

    /// 409 `CONFLICT`.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_code(409, ErrorCode::Conflict, message)
    }

    /// 422 `UNPROCESSABLE_ENTITY`.
    #[must_use]
    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        Self::with_code(422, ErrorCode::UnprocessableEntity, message)
    }

    /// 429 `TOO_MANY_REQUESTS`.
    #[must_use]
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::with_code(429, ErrorCode::TooManyRequests, message)
    }

    /// 500 `INTERNAL_SERVER_ERROR`.
    #[must_use]
    pub fn internal() -> Self {
        Self::with_code(500, ErrorCode::InternalServerError, "Internal server error")
    }

    /// 500 `DATABASE_ERROR`.
    #[must_use]
    pub fn database() -> Self {
        Self::with_code(500, ErrorCode::DatabaseError, "Database operation failed")
    }
}
