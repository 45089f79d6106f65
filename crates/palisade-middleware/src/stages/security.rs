//! Security headers and CORS.
//!
//! Runs first so every response, including short-circuited ones, carries the
//! baseline security headers. CORS echoes the request origin only when it is
//! on the configured allow-list; preflight `OPTIONS` requests short-circuit
//! with an empty 204.

use http::Method;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Outcome};
use crate::types::{Request, Response, ResponseExt};

/// Baseline security headers set on every response.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("X-Content-Type-Options", "nosniff"),
    ("X-Frame-Options", "DENY"),
    ("X-XSS-Protection", "1; mode=block"),
    (
        "Strict-Transport-Security",
        "max-age=31536000; includeSubDomains",
    ),
    ("Referrer-Policy", "strict-origin-when-cross-origin"),
    (
        "Permissions-Policy",
        "geolocation=(), microphone=(), camera=()",
    ),
];

/// Stage that applies security headers and the CORS policy.
#[derive(Debug, Clone)]
pub struct SecurityStage {
    allowed_origins: Vec<String>,
}

impl SecurityStage {
    /// Creates the stage with a CORS origin allow-list.
    #[must_use]
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    fn record_headers(&self, ctx: &mut RequestContext, request: &Request) {
        for (name, value) in SECURITY_HEADERS {
            ctx.push_response_header(*name, *value);
        }

        let origin = request
            .headers()
            .get(http::header::ORIGIN)
            .and_then(|v| v.to_str().ok());

        if let Some(origin) = origin {
            if self.allowed_origins.iter().any(|o| o == origin) {
                ctx.push_response_header("Access-Control-Allow-Origin", origin);
                ctx.push_response_header("Access-Control-Allow-Credentials", "true");
                ctx.push_response_header(
                    "Access-Control-Allow-Methods",
                    "GET, POST, PUT, DELETE, PATCH, OPTIONS",
                );
                ctx.push_response_header(
                    "Access-Control-Allow-Headers",
                    "Content-Type, Authorization",
                );
            }
        }
    }
}

impl Middleware for SecurityStage {
    fn name(&self) -> &'static str {
        "security"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            self.record_headers(ctx, &request);

            if request.method() == Method::OPTIONS {
                return Outcome::Respond(Response::empty(http::StatusCode::NO_CONTENT));
            }

            Outcome::Continue(request)
        })
    }
}
