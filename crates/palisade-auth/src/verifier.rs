//! Bearer-token verification.
//!
//! Two strategies exist, selected once at startup by which kind of key
//! material is configured, never by request content:
//!
//! - **Local**: verify signature and expiry against a shared HS256 secret.
//! - **Remote**: delegate to the identity provider's user-info endpoint.
//!
//! Either way the output contract is the same: an [`AuthContext`] with a
//! stable subject, or a typed [`AuthError`]. A token that verifies but maps
//! to no subject is rejected — every usable credential must resolve to
//! exactly one subject. One verification attempt per request, no retries.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use palisade_core::AuthContext;
use tracing::debug;

use crate::claims::TokenClaims;
use crate::error::AuthError;
use crate::provider::UserInfoClient;

/// The verification strategy, fixed at startup.
pub enum VerifierMode {
    /// Local cryptographic verification with a shared secret.
    Local(Box<DecodingKey>),
    /// Delegated verification via the identity provider.
    Remote(UserInfoClient),
}

impl std::fmt::Debug for VerifierMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(_) => write!(f, "VerifierMode::Local"),
            Self::Remote(client) => f
                .debug_tuple("VerifierMode::Remote")
                .field(&client.base_url())
                .finish(),
        }
    }
}

/// Validates bearer credentials and extracts the caller's subject.
#[derive(Debug)]
pub struct TokenVerifier {
    mode: VerifierMode,
}

impl TokenVerifier {
    /// Creates a local-mode verifier from a shared HS256 secret.
    #[must_use]
    pub fn local(secret: &str) -> Self {
        Self {
            mode: VerifierMode::Local(Box::new(DecodingKey::from_secret(secret.as_bytes()))),
        }
    }

    /// Creates a remote-mode verifier delegating to `provider_url`.
    #[must_use]
    pub fn remote(provider_url: impl Into<String>) -> Self {
        Self {
            mode: VerifierMode::Remote(UserInfoClient::new(provider_url)),
        }
    }

    /// Returns the strategy name, for logs.
    #[must_use]
    pub fn mode_name(&self) -> &'static str {
        match &self.mode {
            VerifierMode::Local(_) => "local",
            VerifierMode::Remote(_) => "remote",
        }
    }

    /// Extracts the token from an `Authorization` header value.
    ///
    /// Only the exact `Bearer <token>` shape is accepted.
    pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
        let header = header.ok_or(AuthError::MissingAuthHeader)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidAuthFormat)?;
        if token.is_empty() {
            return Err(AuthError::InvalidAuthFormat);
        }
        Ok(token)
    }

    /// Verifies the header value end to end: extract, verify, build context.
    pub async fn verify_header(&self, header: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = Self::extract_bearer(header)?;
        self.verify(token).await
    }

    /// Verifies a raw token and returns the caller's identity.
    pub async fn verify(&self, token: &str) -> Result<AuthContext, AuthError> {
        match &self.mode {
            VerifierMode::Local(key) => {
                let validation = Validation::new(Algorithm::HS256);
                let data = decode::<TokenClaims>(token, key, &validation)?;
                let subject = data.claims.sub.ok_or(AuthError::MissingSubject)?;
                debug!(subject = %subject, "verified token locally");
                Ok(AuthContext::new(subject, data.claims.email))
            }
            VerifierMode::Remote(client) => {
                let claims = client.fetch_claims(token).await?;
                let subject = claims.sub.ok_or(AuthError::MissingSubject)?;
                debug!(subject = %subject, "verified token via identity provider");
                Ok(AuthContext::new(subject, claims.email))
            }
        }
    }
}
