//! Per-request context.
//!
//! The [`RequestContext`] carries state through the pipeline: the request
//! id, the resolved client IP, the identity attached by the auth stage, the
//! normalized sections produced by the validator, and headers that guard
//! stages want on the final response regardless of which path produces it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

use palisade_core::AuthContext;
use uuid::Uuid;

/// Normalized request sections produced by the validation stage.
///
/// Handlers read these instead of re-parsing raw input: a declared numeric
/// path parameter arrives here as a number, not a string.
#[derive(Debug, Default, Clone)]
pub struct ValidatedSections {
    /// Normalized request body.
    pub body: Option<serde_json::Value>,
    /// Normalized path parameters.
    pub params: Option<serde_json::Value>,
    /// Normalized query parameters.
    pub query: Option<serde_json::Value>,
}

/// Context that flows through the pipeline for one request.
pub struct RequestContext {
    request_id: Uuid,
    client_ip: String,
    auth: Option<AuthContext>,
    path_params: HashMap<String, String>,
    validated: ValidatedSections,
    pending_headers: Vec<(String, String)>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("client_ip", &self.client_ip)
            .field("auth", &self.auth)
            .field("path_params", &self.path_params)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    /// Creates a context for a request from `client_ip`.
    #[must_use]
    pub fn new(client_ip: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            client_ip: client_ip.into(),
            auth: None,
            path_params: HashMap::new(),
            validated: ValidatedSections::default(),
            pending_headers: Vec::new(),
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the client IP resolved from the connection.
    #[must_use]
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    /// Returns the authenticated caller, if the auth stage attached one.
    ///
    /// `None` after the auth stage ran means the request was rejected
    /// before reaching any downstream stage.
    #[must_use]
    pub const fn auth(&self) -> Option<&AuthContext> {
        self.auth.as_ref()
    }

    /// Attaches the authenticated caller.
    ///
    /// Only the auth stage calls this.
    pub fn set_auth(&mut self, auth: AuthContext) {
        self.auth = Some(auth);
    }

    /// Returns the raw path parameters extracted by the router.
    #[must_use]
    pub const fn path_params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Sets the path parameters. Called by the router before dispatch.
    pub fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    /// Returns the normalized sections written by the validation stage.
    #[must_use]
    pub const fn validated(&self) -> &ValidatedSections {
        &self.validated
    }

    /// Mutable access for the validation stage.
    pub fn validated_mut(&mut self) -> &mut ValidatedSections {
        &mut self.validated
    }

    /// Records a header to set on the final response.
    ///
    /// Guard stages use this so informational headers (rate-limit budget,
    /// security headers) reach the client on success and failure alike.
    pub fn push_response_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pending_headers.push((name.into(), value.into()));
    }

    /// Drains the recorded response headers.
    pub fn take_response_headers(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.pending_headers)
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }
}
