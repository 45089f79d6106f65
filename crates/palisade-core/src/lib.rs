//! # Palisade Core
//!
//! Core types shared by every Palisade crate:
//!
//! - [`HttpError`] / [`ErrorCode`] — the closed fault taxonomy
//! - [`envelope`] — the standardized success/failure response envelope
//! - [`AuthContext`] — the authenticated caller attached by the auth stage
//!
//! Faults split into client faults (4xx: expected, logged at warn) and
//! server faults (5xx: unexpected, logged at error). The envelope module is
//! the single place that derives log severity from a status code.

#![doc(html_root_url = "https://docs.rs/palisade-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod envelope;
pub mod error;
pub mod identity;

pub use envelope::{Envelope, FailureEnvelope, SuccessEnvelope};
pub use error::{ErrorCode, HttpError};
pub use identity::AuthContext;
