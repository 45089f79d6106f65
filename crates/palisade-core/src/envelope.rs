//! The standardized response envelope.
//!
//! Every response body leaving the server is one of two shapes:
//!
//! ```json
//! { "code": 200, "data": { ... }, "message": "Success" }
//! { "code": 404, "error": "NOT_FOUND", "message": "Account not found" }
//! ```
//!
//! The two constructors here are the only way envelopes are produced, and
//! [`error`] is the single writer of log-severity policy: info for
//! successes, warn for 4xx, error for 5xx. No other component decides a log
//! level from a status code.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, HttpError};

/// A success envelope: `{code, data, message}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessEnvelope {
    /// HTTP status code, always equal to the transport status.
    pub code: u16,
    /// The response payload.
    pub data: serde_json::Value,
    /// Human-readable message.
    pub message: String,
}

/// A failure envelope: `{code, error, message}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureEnvelope {
    /// HTTP status code, always equal to the transport status.
    pub code: u16,
    /// Machine-readable error code clients can branch on.
    pub error: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Union of the two envelope shapes.
///
/// Produced once per request and written to the transport exactly once; the
/// two shapes are never mixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Envelope {
    /// The success shape.
    Success(SuccessEnvelope),
    /// The failure shape.
    Failure(FailureEnvelope),
}

impl Envelope {
    /// Returns the status code carried by either shape.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::Success(s) => s.code,
            Self::Failure(f) => f.code,
        }
    }

    /// True if this is the failure shape.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Builds a success envelope and logs one info line.
pub fn success(code: u16, data: serde_json::Value, message: impl Into<String>) -> Envelope {
    let message = message.into();
    tracing::info!(code, message = %message);
    Envelope::Success(SuccessEnvelope {
        code,
        data,
        message,
    })
}

/// Builds a success envelope with the default "Success" message.
pub fn success_default(code: u16, data: serde_json::Value) -> Envelope {
    success(code, data, "Success")
}

/// Builds a failure envelope from any error, logging exactly one line.
///
/// An [`HttpError`] is used as-is; anything else is wrapped as
/// `HttpError::new(fallback, <display>)`. Severity is warn for statuses in
/// [400, 500) and error for 500 and above.
pub fn error(err: &(dyn std::error::Error + 'static), fallback: u16) -> Envelope {
    let http_err = err
        .downcast_ref::<HttpError>()
        .cloned()
        .unwrap_or_else(|| HttpError::new(fallback, err.to_string()));

    from_http_error(&http_err)
}

/// Builds a failure envelope directly from an [`HttpError`].
pub fn from_http_error(err: &HttpError) -> Envelope {
    if err.status() >= 500 {
        tracing::error!(code = err.status(), error = %err.code(), message = %err.message());
    } else {
        tracing::warn!(code = err.status(), error = %err.code(), message = %err.message());
    }

    Envelope::Failure(FailureEnvelope {
        code: err.status(),
        error: err.code(),
        message: err.message().to_string(),
    })
}
