//! Main configuration types.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Development fallback secret, never accepted in production.
pub const DEV_JWT_SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters-long";

/// Complete Palisade configuration.
///
/// Built from defaults, an optional `.env` file, and `PALISADE_*`
/// environment overrides via [`ConfigLoader`](crate::ConfigLoader).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PalisadeConfig {
    /// Deployment environment: "development" or "production".
    pub env: String,
    /// Server configuration.
    pub server: ServerConfig,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Rate-limit policies.
    pub rate_limit: RateLimitSection,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub addr: String,
}

/// CORS settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorsConfig {
    /// Origins allowed to make credentialed cross-origin requests.
    pub allowed_origins: Vec<String>,
}

/// Authentication settings.
///
/// Exactly one verification mode is derivable: a provider URL selects
/// remote mode, otherwise the shared secret selects local mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    /// Shared HS256 secret for local verification and token issuing.
    pub jwt_secret: Option<String>,
    /// Identity-provider base URL for remote verification.
    pub provider_url: Option<String>,
    /// Lifetime of locally issued access tokens.
    pub token_ttl_seconds: i64,
}

/// One rate-limit policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatePolicyConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window length in seconds.
    pub window_seconds: u64,
}

/// The two policies the starter ships: broad and auth-only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitSection {
    /// Applied to all traffic.
    pub standard: RatePolicyConfig,
    /// Applied to `/api/auth/*` routes.
    pub auth: RatePolicyConfig,
}

/// The verification strategy resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationMode {
    /// Verify locally with this shared secret.
    Local(String),
    /// Delegate to the identity provider at this URL.
    Remote(String),
}

impl Default for PalisadeConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            server: ServerConfig {
                addr: "0.0.0.0:3002".to_string(),
            },
            cors: CorsConfig {
                allowed_origins: vec!["http://localhost:3001".to_string()],
            },
            auth: AuthConfig {
                jwt_secret: None,
                provider_url: None,
                token_ttl_seconds: 3600,
            },
            rate_limit: RateLimitSection {
                standard: RatePolicyConfig {
                    max_requests: 100,
                    window_seconds: 15 * 60,
                },
                auth: RatePolicyConfig {
                    max_requests: 5,
                    window_seconds: 15 * 60,
                },
            },
        }
    }
}

impl PalisadeConfig {
    /// True in a production deployment.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    /// Resolves the verification mode.
    ///
    /// A provider URL wins; otherwise the configured secret; in
    /// development only, a built-in fallback secret.
    pub fn verification_mode(&self) -> Result<VerificationMode, ConfigError> {
        if let Some(url) = &self.auth.provider_url {
            return Ok(VerificationMode::Remote(url.clone()));
        }
        if let Some(secret) = &self.auth.jwt_secret {
            return Ok(VerificationMode::Local(secret.clone()));
        }
        if self.is_production() {
            return Err(ConfigError::missing_field("auth.jwt_secret"));
        }
        Ok(VerificationMode::Local(DEV_JWT_SECRET.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.addr",
                format!("invalid socket address: {}", self.server.addr),
            ));
        }

        for (name, policy) in [
            ("rate_limit.standard", self.rate_limit.standard),
            ("rate_limit.auth", self.rate_limit.auth),
        ] {
            if policy.max_requests == 0 {
                return Err(ConfigError::invalid_value(
                    format!("{name}.max_requests"),
                    "must be greater than zero",
                ));
            }
            if policy.window_seconds == 0 {
                return Err(ConfigError::invalid_value(
                    format!("{name}.window_seconds"),
                    "must be greater than zero",
                ));
            }
        }

        if self.auth.token_ttl_seconds <= 0 {
            return Err(ConfigError::invalid_value(
                "auth.token_ttl_seconds",
                "must be greater than zero",
            ));
        }

        // Fails in production when no key material is configured.
        self.verification_mode().map(|_| ())
    }
}
