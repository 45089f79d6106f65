//! # Palisade Auth
//!
//! Bearer-token verification for the Palisade pipeline.
//!
//! The verification strategy is a startup-time decision driven by which key
//! material is configured:
//!
//! - a shared JWT secret ⇒ [`TokenVerifier::local`] (HS256 signature +
//!   expiry checks, `sub`/`email` claim extraction)
//! - an identity-provider URL ⇒ [`TokenVerifier::remote`] (delegated
//!   verification via the provider's user-info endpoint)
//!
//! Request content never influences the strategy, so verification is
//! deterministic per deployment. All failures — missing header, malformed
//! header, bad signature, expiry, provider errors, missing subject —
//! normalize to a 401 through [`AuthError::to_http_error`].

#![doc(html_root_url = "https://docs.rs/palisade-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod claims;
pub mod error;
pub mod issuer;
pub mod provider;
pub mod verifier;

pub use claims::TokenClaims;
pub use error::AuthError;
pub use issuer::TokenIssuer;
pub use provider::{ProviderClaims, UserInfoClient};
pub use verifier::{TokenVerifier, VerifierMode};
