//! # Palisade Config
//!
//! Typed configuration for the Palisade starter.
//!
//! Configuration is layered: built-in defaults, then a `.env` file in
//! development, then `PALISADE_*` environment variables. Loading validates
//! eagerly — a malformed address or number is a [`ConfigError`], and a
//! production deployment without verification key material refuses to
//! start.

#![doc(html_root_url = "https://docs.rs/palisade-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{
    AuthConfig, CorsConfig, PalisadeConfig, RateLimitSection, RatePolicyConfig, ServerConfig,
    VerificationMode, DEV_JWT_SECRET,
};
pub use error::ConfigError;
pub use loader::ConfigLoader;
