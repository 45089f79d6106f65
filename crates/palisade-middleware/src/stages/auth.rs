//! Authentication stage.
//!
//! Extracts the bearer credential from the `Authorization` header and runs
//! it through the configured [`TokenVerifier`]. On success the caller's
//! [`AuthContext`](palisade_core::AuthContext) is attached to the request
//! context for downstream stages
//! and the handler; on any failure the stage responds with a 401 envelope
//! and nothing downstream runs. One verification attempt per request.

use std::sync::Arc;

use palisade_auth::TokenVerifier;
use palisade_core::envelope;
use tracing::debug;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Outcome};
use crate::types::{Request, Response, ResponseExt};

/// Stage that requires a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthStage {
    verifier: Arc<TokenVerifier>,
}

impl AuthStage {
    /// Creates the stage around a shared verifier.
    #[must_use]
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl Middleware for AuthStage {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let header = request
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());

            match self.verifier.verify_header(header).await {
                Ok(auth) => {
                    debug!(subject = %auth.log_id(), "request authenticated");
                    ctx.set_auth(auth);
                    Outcome::Continue(request)
                }
                Err(err) => {
                    debug!(
                        path = %request.uri().path(),
                        detail = %err,
                        "token verification failed"
                    );
                    Outcome::Respond(Response::from_envelope(&envelope::from_http_error(
                        &err.to_http_error(),
                    )))
                }
            }
        })
    }
}
