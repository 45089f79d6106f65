//! Access-token issuing for the starter's local auth endpoints.
//!
//! Login and signup hand out HS256 tokens signed with the same shared secret
//! the local verifier checks against. A deployment delegating to an external
//! identity provider does not use this.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::claims::TokenClaims;
use crate::error::AuthError;

/// Issues short-lived HS256 access tokens.
pub struct TokenIssuer {
    key: EncodingKey,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer signing with `secret`, valid for `ttl_seconds`.
    #[must_use]
    pub fn new(secret: &str, ttl_seconds: i64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    /// Issues a token for `subject`.
    pub fn issue(&self, subject: &str, email: Option<&str>) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: Some(subject.to_string()),
            email: email.map(String::from),
            exp: now + self.ttl_seconds,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.key).map_err(AuthError::from)
    }
}
