//! Remote identity-provider client.
//!
//! In remote mode the verifier does not hold key material at all: the token
//! is presented to the provider's user-info endpoint and the returned claims
//! are trusted. Any provider-reported error, transport failure, or empty
//! claim set normalizes to a rejection.

use serde::Deserialize;

use crate::error::AuthError;

/// Claims returned by the identity provider for a verified token.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderClaims {
    /// Subject identifier. Providers commonly name this `id`.
    #[serde(alias = "id")]
    pub sub: Option<String>,
    /// Email address, if known to the provider.
    pub email: Option<String>,
}

/// HTTP client for the provider's user-info endpoint.
#[derive(Debug, Clone)]
pub struct UserInfoClient {
    http: reqwest::Client,
    base_url: String,
}

impl UserInfoClient {
    /// Creates a client for the provider rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Returns the configured provider base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Presents `token` to the provider and returns its claims.
    ///
    /// One attempt per call; the caller does not retry within a request.
    pub async fn fetch_claims(&self, token: &str) -> Result<ProviderClaims, AuthError> {
        let url = format!("{}/auth/v1/user", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "provider returned status {status}"
            )));
        }

        response
            .json::<ProviderClaims>()
            .await
            .map_err(|e| AuthError::Provider(format!("invalid provider response: {e}")))
    }
}
