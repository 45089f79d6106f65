//! Configuration loader with layered approach.
//!
//! Layers apply in order, later overriding earlier:
//!
//! 1. Built-in defaults
//! 2. `.env` file (development convenience, via dotenvy)
//! 3. `PALISADE_*` environment variables

use std::env;

use crate::config::PalisadeConfig;
use crate::error::ConfigError;

/// Environment variables recognized by the loader.
const ENV_VARS: &[&str] = &[
    "PALISADE_ENV",
    "PALISADE_SERVER_ADDR",
    "PALISADE_CORS_ORIGINS",
    "PALISADE_AUTH_JWT_SECRET",
    "PALISADE_AUTH_PROVIDER_URL",
    "PALISADE_AUTH_TOKEN_TTL_SECS",
    "PALISADE_RATE_LIMIT_STANDARD_MAX",
    "PALISADE_RATE_LIMIT_STANDARD_WINDOW_SECS",
    "PALISADE_RATE_LIMIT_AUTH_MAX",
    "PALISADE_RATE_LIMIT_AUTH_WINDOW_SECS",
];

/// Loads [`PalisadeConfig`] from defaults and the environment.
///
/// # Example
///
/// ```no_run
/// use palisade_config::ConfigLoader;
///
/// # fn main() -> Result<(), palisade_config::ConfigError> {
/// let config = ConfigLoader::new().with_dotenv().load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: PalisadeConfig,
}

impl ConfigLoader {
    /// Creates a loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `.env` file into the process environment, if one exists.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        dotenvy::dotenv().ok();
        self
    }

    /// Applies process environment variables and validates the result.
    pub fn load(self) -> Result<PalisadeConfig, ConfigError> {
        let config = self.apply_vars(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from a lookup function.
    ///
    /// Separated from [`load`](Self::load) so tests can feed variables
    /// without touching the process environment.
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<PalisadeConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PALISADE_ENV") {
            self.config.env = value;
        }
        if let Some(value) = lookup("PALISADE_SERVER_ADDR") {
            self.config.server.addr = value;
        }
        if let Some(value) = lookup("PALISADE_CORS_ORIGINS") {
            self.config.cors.allowed_origins = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(value) = lookup("PALISADE_AUTH_JWT_SECRET") {
            self.config.auth.jwt_secret = Some(value);
        }
        if let Some(value) = lookup("PALISADE_AUTH_PROVIDER_URL") {
            self.config.auth.provider_url = Some(value);
        }
        if let Some(value) = lookup("PALISADE_AUTH_TOKEN_TTL_SECS") {
            self.config.auth.token_ttl_seconds =
                parse_var("PALISADE_AUTH_TOKEN_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("PALISADE_RATE_LIMIT_STANDARD_MAX") {
            self.config.rate_limit.standard.max_requests =
                parse_var("PALISADE_RATE_LIMIT_STANDARD_MAX", &value)?;
        }
        if let Some(value) = lookup("PALISADE_RATE_LIMIT_STANDARD_WINDOW_SECS") {
            self.config.rate_limit.standard.window_seconds =
                parse_var("PALISADE_RATE_LIMIT_STANDARD_WINDOW_SECS", &value)?;
        }
        if let Some(value) = lookup("PALISADE_RATE_LIMIT_AUTH_MAX") {
            self.config.rate_limit.auth.max_requests =
                parse_var("PALISADE_RATE_LIMIT_AUTH_MAX", &value)?;
        }
        if let Some(value) = lookup("PALISADE_RATE_LIMIT_AUTH_WINDOW_SECS") {
            self.config.rate_limit.auth.window_seconds =
                parse_var("PALISADE_RATE_LIMIT_AUTH_WINDOW_SECS", &value)?;
        }

        Ok(self.config)
    }

    /// Returns the recognized variable names, for startup diagnostics.
    #[must_use]
    pub const fn recognized_vars() -> &'static [&'static str] {
        ENV_VARS
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(name, format!("could not parse {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let config = ConfigLoader::new().apply_vars(|_| None).unwrap();
        assert_eq!(config, PalisadeConfig::default());
    }

    #[test]
    fn test_env_overrides_applied() {
        let vars = vars(&[
            ("PALISADE_ENV", "production"),
            ("PALISADE_SERVER_ADDR", "127.0.0.1:8080"),
            ("PALISADE_AUTH_JWT_SECRET", "prod-secret"),
            ("PALISADE_RATE_LIMIT_STANDARD_MAX", "250"),
        ]);
        let config = ConfigLoader::new()
            .apply_vars(|name| vars.get(name).cloned())
            .unwrap();

        assert_eq!(config.env, "production");
        assert_eq!(config.server.addr, "127.0.0.1:8080");
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("prod-secret"));
        assert_eq!(config.rate_limit.standard.max_requests, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cors_origins_split_on_commas() {
        let vars = vars(&[(
            "PALISADE_CORS_ORIGINS",
            "http://localhost:3001, https://app.example.com",
        )]);
        let config = ConfigLoader::new()
            .apply_vars(|name| vars.get(name).cloned())
            .unwrap();

        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:3001", "https://app.example.com"]
        );
    }

    #[test]
    fn test_malformed_number_is_an_error_not_a_panic() {
        let vars = vars(&[("PALISADE_RATE_LIMIT_AUTH_MAX", "five")]);
        let err = ConfigLoader::new()
            .apply_vars(|name| vars.get(name).cloned())
            .unwrap_err();
        assert!(err.to_string().contains("PALISADE_RATE_LIMIT_AUTH_MAX"));
    }

    #[test]
    fn test_recognized_vars_nonempty() {
        assert!(ConfigLoader::recognized_vars().contains(&"PALISADE_AUTH_JWT_SECRET"));
    }
}
