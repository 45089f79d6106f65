//! Per-client-IP rate limiting.
//!
//! Fixed-window counting: the first request from an IP creates an entry with
//! `count = 1` and a reset time one window ahead; requests inside the window
//! increment it; a request after the reset time replaces the entry rather
//! than incrementing it. Once the post-increment count exceeds the policy
//! maximum the request is rejected with 429 and nothing downstream runs.
//!
//! Entry mutation goes through the map's entry API, so concurrent requests
//! from the same IP serialize on that key while other keys proceed in
//! parallel. Stale entries are swept opportunistically on a small random
//! fraction of requests; there is no background task.
//!
//! Two policies exist in the starter: a broad default for all traffic and a
//! stricter one for the authentication endpoints. Same algorithm, different
//! thresholds.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use palisade_core::{envelope, HttpError};
use tracing::warn;

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Outcome};
use crate::types::{Request, Response, ResponseExt};

/// Rate limit header names.
pub mod headers {
    /// Maximum requests allowed in the window.
    pub const LIMIT: &str = "X-RateLimit-Limit";
    /// Remaining requests in the current window.
    pub const REMAINING: &str = "X-RateLimit-Remaining";
    /// ISO-8601 timestamp when the window resets.
    pub const RESET: &str = "X-RateLimit-Reset";
}

/// A rate-limit policy: how many requests fit in one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window length.
    pub window: Duration,
}

impl RateLimitPolicy {
    /// The broad default applied to all traffic: 100 requests / 15 minutes.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }

    /// The stricter policy for auth endpoints: 5 requests / 15 minutes.
    #[must_use]
    pub const fn auth() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// One window's worth of counting for a single IP.
#[derive(Debug, Clone)]
struct WindowEntry {
    count: u64,
    window_reset_at: DateTime<Utc>,
}

/// Outcome of checking one request against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Within budget.
    Allowed {
        /// The policy maximum.
        limit: u64,
        /// Requests left in this window after this one.
        remaining: u64,
        /// When the window resets.
        reset_at: DateTime<Utc>,
    },
    /// Budget exhausted.
    Limited {
        /// The policy maximum.
        limit: u64,
        /// When the window resets.
        reset_at: DateTime<Utc>,
    },
}

/// The keyed counter table behind the stage.
///
/// Injected as a shared handle so both pipelines (standard and auth) can
/// own stages over independent tables, and so a deployment can swap the
/// opportunistic sweep for a timer-driven one without touching callers.
#[derive(Debug, Default)]
pub struct RateLimitStore {
    entries: DashMap<String, WindowEntry>,
}

impl RateLimitStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a request from `key` against `policy`.
    ///
    /// The whole read-modify-write happens under the entry lock for that
    /// key; a burst of concurrent requests from one IP cannot overshoot
    /// the ceiling.
    pub fn check(
        &self,
        key: &str,
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window =
            chrono::Duration::from_std(policy.window).unwrap_or_else(|_| chrono::Duration::zero());

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                window_reset_at: now + window,
            });

        if now > entry.window_reset_at {
            entry.count = 0;
            entry.window_reset_at = now + window;
        }

        entry.count += 1;

        if entry.count > policy.max_requests {
            RateLimitDecision::Limited {
                limit: policy.max_requests,
                reset_at: entry.window_reset_at,
            }
        } else {
            RateLimitDecision::Allowed {
                limit: policy.max_requests,
                remaining: policy.max_requests - entry.count,
                reset_at: entry.window_reset_at,
            }
        }
    }

    /// Removes every entry whose window has expired.
    pub fn sweep_expired(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, entry| now <= entry.window_reset_at);
    }

    /// Returns the number of tracked keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no keys are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stage enforcing a [`RateLimitPolicy`] per client IP.
#[derive(Debug)]
pub struct RateLimitStage {
    policy: RateLimitPolicy,
    message: String,
    store: Arc<RateLimitStore>,
    sweep_probability: f64,
}

impl RateLimitStage {
    /// Creates a stage with its own store.
    #[must_use]
    pub fn new(policy: RateLimitPolicy, message: impl Into<String>) -> Self {
        Self::with_store(policy, message, Arc::new(RateLimitStore::new()))
    }

    /// Creates a stage over an injected store.
    #[must_use]
    pub fn with_store(
        policy: RateLimitPolicy,
        message: impl Into<String>,
        store: Arc<RateLimitStore>,
    ) -> Self {
        Self {
            policy,
            message: message.into(),
            store,
            sweep_probability: 0.01,
        }
    }

    /// The standard stage applied to all traffic.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            RateLimitPolicy::standard(),
            "Too many requests from this IP, please try again later.",
        )
    }

    /// The strict stage applied to authentication endpoints.
    #[must_use]
    pub fn strict() -> Self {
        Self::new(
            RateLimitPolicy::auth(),
            "Too many authentication attempts, please try again later.",
        )
    }

    /// Returns the configured policy.
    #[must_use]
    pub const fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Resolves the rate-limit key for a request.
    ///
    /// Proxy headers take precedence over the connection address:
    /// `CF-Connecting-IP`, then `X-Real-IP`, then the first entry of
    /// `X-Forwarded-For`, then the connection IP.
    #[must_use]
    pub fn client_key(ctx: &RequestContext, request: &Request) -> String {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        header("cf-connecting-ip")
            .or_else(|| header("x-real-ip"))
            .or_else(|| {
                header("x-forwarded-for")
                    .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
            })
            .unwrap_or_else(|| {
                let ip = ctx.client_ip();
                if ip.is_empty() {
                    "unknown".to_string()
                } else {
                    ip.to_string()
                }
            })
    }

    fn record_headers(ctx: &mut RequestContext, limit: u64, remaining: u64, reset_at: DateTime<Utc>) {
        ctx.push_response_header(headers::LIMIT, limit.to_string());
        ctx.push_response_header(headers::REMAINING, remaining.to_string());
        ctx.push_response_header(
            headers::RESET,
            reset_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        );
    }
}

impl Middleware for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            let key = Self::client_key(ctx, &request);
            let now = Utc::now();

            let decision = self.store.check(&key, self.policy, now);

            if rand::random::<f64>() < self.sweep_probability {
                self.store.sweep_expired(now);
            }

            match decision {
                RateLimitDecision::Allowed {
                    limit,
                    remaining,
                    reset_at,
                } => {
                    Self::record_headers(ctx, limit, remaining, reset_at);
                    Outcome::Continue(request)
                }
                RateLimitDecision::Limited { limit, reset_at } => {
                    warn!(
                        ip = %key,
                        path = %request.uri().path(),
                        method = %request.method(),
                        "rate limit exceeded"
                    );
                    Self::record_headers(ctx, limit, 0, reset_at);
                    Outcome::Respond(Response::from_envelope(&envelope::from_http_error(
                        &HttpError::too_many_requests(self.message.clone()),
                    )))
                }
            }
        })
    }
}
