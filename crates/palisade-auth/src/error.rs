//! Verification error types.

use palisade_core::HttpError;
use thiserror::Error;

/// Errors raised while verifying a bearer credential.
///
/// Every variant normalizes to a 401 on the wire: verification never lets a
/// fault escape the pipeline boundary uncaught.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No `Authorization` header on the request.
    #[error("missing authorization header")]
    MissingAuthHeader,

    /// Header present but not `Bearer <token>`.
    #[error("invalid authorization header format")]
    InvalidAuthFormat,

    /// Signature, expiry, or structural token failure.
    #[error("token validation failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Token verified but carried no `sub` claim.
    #[error("token has no subject claim")]
    MissingSubject,

    /// The identity provider rejected the token or could not be reached.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Verifier was built from unusable key material.
    #[error("verifier configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Maps this failure to the wire-level fault.
    ///
    /// Missing/malformed headers read as "token required"; everything else
    /// reads as "invalid or expired token". Detail stays in the logs.
    #[must_use]
    pub fn to_http_error(&self) -> HttpError {
        match self {
            Self::MissingAuthHeader | Self::InvalidAuthFormat => {
                HttpError::unauthorized("Authentication token required")
            }
            _ => HttpError::invalid_token(),
        }
    }
}
