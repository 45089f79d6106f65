//! The identity-service collaborator.
//!
//! Signup and login delegate credential handling to an identity service,
//! mirroring how the verifier treats identity as an external capability.
//! The starter ships [`LocalIdentityService`], which registers subjects in
//! memory and mints HS256 tokens with the shared secret the local verifier
//! checks. A deployment pointing at a real provider replaces this.

use std::collections::HashMap;

use palisade_auth::TokenIssuer;
use palisade_core::HttpError;
use palisade_middleware::BoxFuture;
use parking_lot::RwLock;
use uuid::Uuid;

/// An authenticated session minted at login.
#[derive(Debug, Clone)]
pub struct Session {
    /// The subject the credentials resolve to.
    pub subject_id: String,
    /// Bearer token for subsequent requests.
    pub access_token: String,
}

/// Registers subjects and exchanges credentials for sessions.
pub trait IdentityService: Send + Sync + 'static {
    /// Registers a new subject, returning its id.
    fn register<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<String, HttpError>>;

    /// Exchanges credentials for a session.
    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Session, HttpError>>;
}

struct Registration {
    subject_id: String,
    password: String,
}

/// In-memory identity service for development and tests.
///
/// Dev stand-in for an external provider: credentials live only in process
/// memory and are compared verbatim. Do not deploy this against real users.
pub struct LocalIdentityService {
    users: RwLock<HashMap<String, Registration>>,
    issuer: TokenIssuer,
}

impl std::fmt::Debug for LocalIdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIdentityService")
            .field("registered", &self.users.read().len())
            .finish_non_exhaustive()
    }
}

impl LocalIdentityService {
    /// Creates a service minting tokens with `secret`.
    #[must_use]
    pub fn new(secret: &str, token_ttl_seconds: i64) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            issuer: TokenIssuer::new(secret, token_ttl_seconds),
        }
    }
}

impl IdentityService for LocalIdentityService {
    fn register<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<String, HttpError>> {
        Box::pin(async move {
            let mut users = self.users.write();
            if users.contains_key(email) {
                // The original error surface deliberately stays vague here.
                return Err(HttpError::unauthorized("Unable to sign up"));
            }

            let subject_id = Uuid::now_v7().to_string();
            users.insert(
                email.to_string(),
                Registration {
                    subject_id: subject_id.clone(),
                    password: password.to_string(),
                },
            );
            tracing::debug!(subject = %subject_id, "registered subject");
            Ok(subject_id)
        })
    }

    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, Result<Session, HttpError>> {
        Box::pin(async move {
            let subject_id = {
                let users = self.users.read();
                let registration = users
                    .get(email)
                    .filter(|r| r.password == password)
                    .ok_or_else(|| HttpError::unauthorized("Invalid credentials"))?;
                registration.subject_id.clone()
            };

            let access_token = self
                .issuer
                .issue(&subject_id, Some(email))
                .map_err(|_| HttpError::internal())?;

            Ok(Session {
                subject_id,
                access_token,
            })
        })
    }
}
