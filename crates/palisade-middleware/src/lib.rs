//! # Palisade Middleware
//!
//! The request-processing pipeline every inbound request passes through
//! before reaching business logic.
//!
//! ```text
//! Request → Security → RateLimit → [Auth] → [Validation] → Handler
//!                                                             ↓
//! Response ←──────────── envelope + fault boundary ←──────────┘
//! ```
//!
//! Stages form an explicit ordered list. Each stage resolves to one
//! [`Outcome`]: continue with the request, or respond and stop the chain.
//! The handler runs only when every stage continued, and the terminal fault
//! boundary in [`pipeline`] guarantees exactly one enveloped response per
//! request, with log severity derived from the status code in exactly one
//! place ([`palisade_core::envelope`]).
//!
//! Auth and validation are route-dependent: the server composes a chain per
//! route class, always in the order above. The rate limiter is the only
//! stage with cross-request state; its counter table serializes updates per
//! client IP while unrelated IPs proceed in parallel.

#![doc(html_root_url = "https://docs.rs/palisade-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::{RequestContext, ValidatedSections};
pub use middleware::{BoxFuture, FnStage, Middleware, Outcome};
pub use pipeline::{BoxedStage, Pipeline, PipelineBuilder};
pub use types::{Request, Response, ResponseExt};
