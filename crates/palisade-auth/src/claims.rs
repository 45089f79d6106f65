//! Token claims.

use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
///
/// `sub` is deserialized as optional so a signature-valid token without a
/// subject can be rejected explicitly rather than failing as a decode error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (stable account identifier).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Email address, where the issuer included one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued at time (Unix timestamp).
    pub iat: i64,
}
