//! # Palisade
//!
//! Batteries-included web backend starter: an HTTP server, account CRUD,
//! and a fixed-order request pipeline (security headers/CORS → rate
//! limiting → auth → validation → handler → response envelope).
//!
//! This facade re-exports the public API of the member crates.
//!
//! ```ignore
//! use palisade::config::ConfigLoader;
//! use palisade::server::{AppState, Server};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = ConfigLoader::new().with_dotenv().load()?;
//! let state = AppState::builder(config).build()?;
//! Server::new(state).run().await
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/palisade/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use palisade_auth as auth;
pub use palisade_config as config;
pub use palisade_core as core;
pub use palisade_middleware as middleware;
pub use palisade_server as server;

pub use palisade_core::{Envelope, ErrorCode, HttpError};
pub use palisade_middleware::{Middleware, Outcome, Pipeline, RequestContext};
