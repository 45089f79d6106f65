//! Pipeline composition.
//!
//! The pipeline is an explicit ordered list of stages. Processing walks the
//! list; each stage either continues or responds, and the loop stops at the
//! first response. The handler runs only when every stage continued. The
//! ordering contract is fixed by construction: security headers/CORS first,
//! then rate limiting, then (for protected routes) auth, then validation.
//!
//! The terminal fault boundary lives here too: a handler fault that is an
//! [`HttpError`] becomes its envelope; anything unrecognized becomes a
//! generic 500 whose detail goes to the log, never to the client.
//!
//! Exactly one response is written per request. A stage returns either the
//! request or a response — never both — so a double write is not
//! representable.

use std::sync::Arc;

use http::header::{HeaderName, HeaderValue};
use palisade_core::{envelope, Envelope, HttpError};

use crate::context::RequestContext;
use crate::middleware::{BoxFuture, Middleware, Outcome};
use crate::types::{Request, Response, ResponseExt};

/// A type-erased stage held by the pipeline.
pub type BoxedStage = Arc<dyn Middleware>;

/// An ordered chain of guard stages ending at a handler.
pub struct Pipeline {
    stages: Vec<BoxedStage>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through the stages and, if none responded, the
    /// handler.
    pub async fn process<H>(
        &self,
        ctx: &mut RequestContext,
        mut request: Request,
        handler: H,
    ) -> Response
    where
        H: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Result<Envelope, anyhow::Error>>
            + Send,
    {
        for stage in &self.stages {
            tracing::trace!(stage = stage.name(), request_id = %ctx.request_id(), "running stage");
            match stage.handle(ctx, request).await {
                Outcome::Continue(next) => request = next,
                Outcome::Respond(response) => return Self::finalize(ctx, response),
            }
        }

        let envelope = match handler(ctx, request).await {
            Ok(envelope) => envelope,
            Err(fault) => Self::normalize_fault(ctx, &fault),
        };

        Self::finalize(ctx, Response::from_envelope(&envelope))
    }

    /// The terminal fault boundary.
    fn normalize_fault(ctx: &RequestContext, fault: &anyhow::Error) -> Envelope {
        if let Some(err) = fault.downcast_ref::<HttpError>() {
            return envelope::from_http_error(err);
        }

        tracing::error!(
            request_id = %ctx.request_id(),
            detail = %fault,
            "unrecognized fault reached the pipeline boundary"
        );
        envelope::from_http_error(&HttpError::internal())
    }

    /// Applies headers recorded by guard stages to the final response.
    ///
    /// Runs on every exit path, so rate-limit and security headers reach
    /// the client whether the request succeeded or short-circuited.
    fn finalize(ctx: &mut RequestContext, mut response: Response) -> Response {
        for (name, value) in ctx.take_response_headers() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedStage>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage to the chain.
    #[must_use]
    pub fn stage<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already-shared stage.
    ///
    /// Stages carrying cross-request state (the rate limiter's counter
    /// table) are shared between pipelines this way.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedStage) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnStage;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn test_request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn read_body(response: Response) -> String {
        use http_body_util::BodyExt;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn ok_handler(
    ) -> impl FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Result<Envelope, anyhow::Error>>
    {
        |_ctx, _req| {
            Box::pin(async {
                Ok(envelope::success_default(
                    200,
                    serde_json::json!({"handled": true}),
                ))
            })
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = order.clone();
        let o2 = order.clone();
        let pipeline = Pipeline::builder()
            .stage(FnStage::new("first", move |_ctx: &mut RequestContext, req: Request| {
                let order = o1.clone();
                async move {
                    order.lock().unwrap().push("first");
                    Outcome::Continue(req)
                }
            }))
            .stage(FnStage::new("second", move |_ctx: &mut RequestContext, req: Request| {
                let order = o2.clone();
                async move {
                    order.lock().unwrap().push("second");
                    Outcome::Continue(req)
                }
            }))
            .build();

        let mut ctx = RequestContext::new("127.0.0.1");
        let response = pipeline.process(&mut ctx, test_request(), ok_handler()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(pipeline.stage_names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler_and_later_stages() {
        let handler_ran = Arc::new(AtomicBool::new(false));
        let later_ran = Arc::new(AtomicBool::new(false));

        let later = later_ran.clone();
        let pipeline = Pipeline::builder()
            .stage(FnStage::new("block", |_ctx: &mut RequestContext, _req: Request| async {
                Outcome::Respond(Response::from_envelope(&envelope::from_http_error(
                    &HttpError::too_many_requests("slow down"),
                )))
            }))
            .stage(FnStage::new("later", move |_ctx: &mut RequestContext, req: Request| {
                let later = later.clone();
                async move {
                    later.store(true, Ordering::SeqCst);
                    Outcome::Continue(req)
                }
            }))
            .build();

        let flag = handler_ran.clone();
        let mut ctx = RequestContext::new("127.0.0.1");
        let response = pipeline
            .process(&mut ctx, test_request(), move |_ctx, _req| {
                Box::pin(async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(envelope::success_default(200, serde_json::Value::Null))
                })
            })
            .await;

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(!handler_ran.load(Ordering::SeqCst));
        assert!(!later_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_http_error_fault_keeps_its_status() {
        let pipeline = Pipeline::builder().build();
        let mut ctx = RequestContext::new("127.0.0.1");

        let response = pipeline
            .process(&mut ctx, test_request(), |_ctx, _req| {
                Box::pin(async { Err(anyhow::Error::new(HttpError::not_found("Account"))) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = read_body(response).await;
        assert!(body.contains("NOT_FOUND"));
        assert!(body.contains("Account not found"));
    }

    #[tokio::test]
    async fn test_unrecognized_fault_becomes_generic_500() {
        let pipeline = Pipeline::builder().build();
        let mut ctx = RequestContext::new("127.0.0.1");

        let response = pipeline
            .process(&mut ctx, test_request(), |_ctx, _req| {
                Box::pin(async { Err(anyhow::anyhow!("connection pool exhausted on shard 7")) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body(response).await;
        assert!(body.contains("INTERNAL_SERVER_ERROR"));
        assert!(body.contains("Internal server error"));
        // Internal detail never reaches the client.
        assert!(!body.contains("shard 7"));
    }

    #[tokio::test]
    async fn test_pending_headers_applied_on_success_and_short_circuit() {
        // Success path.
        let pipeline = Pipeline::builder()
            .stage(FnStage::new("mark", |ctx: &mut RequestContext, req: Request| {
                ctx.push_response_header("X-RateLimit-Limit", "100");
                async move { Outcome::Continue(req) }
            }))
            .build();
        let mut ctx = RequestContext::new("127.0.0.1");
        let response = pipeline.process(&mut ctx, test_request(), ok_handler()).await;
        assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "100");

        // Short-circuit path.
        let pipeline = Pipeline::builder()
            .stage(FnStage::new("mark", |ctx: &mut RequestContext, _req: Request| {
                ctx.push_response_header("X-RateLimit-Limit", "100");
                async move {
                    Outcome::Respond(Response::from_envelope(&envelope::from_http_error(
                        &HttpError::too_many_requests("slow down"),
                    )))
                }
            }))
            .build();
        let mut ctx = RequestContext::new("127.0.0.1");
        let response = pipeline.process(&mut ctx, test_request(), ok_handler()).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "100");
    }

    #[test]
    fn test_empty_pipeline_count() {
        let pipeline = Pipeline::builder().build();
        assert_eq!(pipeline.stage_count(), 0);
    }
}
