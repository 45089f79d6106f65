//! # Palisade Server
//!
//! The HTTP surface of the Palisade starter: routing, account CRUD, the
//! per-route pipeline wiring, and the server binary.
//!
//! Every route's chain is composed in [`state`] from the shared guard
//! stages, always in the fixed order security → rate limit → auth →
//! validation → handler. Persistence ([`accounts::AccountStore`]) and
//! credential handling ([`identity::IdentityService`]) are injected
//! collaborators; the starter ships in-memory implementations of both.

#![doc(html_root_url = "https://docs.rs/palisade-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod accounts;
pub mod handlers;
pub mod identity;
pub mod logging;
pub mod router;
pub mod schemas;
pub mod server;
pub mod state;

pub use accounts::{Account, AccountStore, AccountUpdate, MemoryAccountStore, NewAccount, StoreError};
pub use identity::{IdentityService, LocalIdentityService, Session};
pub use logging::{init_logging, LogConfig};
pub use router::{Operation, RouteMatch, Router};
pub use server::{dispatch, handle_request, Server};
pub use state::{AppState, AppStateBuilder};
