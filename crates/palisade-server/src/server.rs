//! HTTP server and request dispatch.
//!
//! Built on Hyper and Tokio: one task per connection, one buffered request
//! at a time through [`dispatch`]. Dispatch is where route selection meets
//! the pipeline: match the route, pick its chain, run it, and let the
//! pipeline produce the single enveloped response.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use palisade_core::{envelope, ErrorCode, HttpError};
use palisade_middleware::{Request, RequestContext, Response};

use crate::handlers::{self, HandlerInput};
use crate::state::AppState;

/// The Palisade HTTP server.
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Creates a server over shared state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn run(&self) -> anyhow::Result<()> {
        let addr: SocketAddr = self.state.config().server.addr.parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(
            %addr,
            env = %self.state.config().env,
            verifier = self.state.verifier().mode_name(),
            "palisade server listening"
        );

        loop {
            let (stream, remote) = listener.accept().await?;
            let state = self.state.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let client_ip = remote.ip().to_string();

                let service = service_fn(move |request: http::Request<Incoming>| {
                    let state = state.clone();
                    let client_ip = client_ip.clone();
                    async move {
                        let response = handle_request(state, client_ip, request).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!(error = %err, "connection closed with error");
                }
            });
        }
    }
}

/// Buffers the request body and dispatches.
pub async fn handle_request(
    state: Arc<AppState>,
    client_ip: String,
    request: http::Request<Incoming>,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            tracing::debug!(error = %err, "failed to read request body");
            Bytes::new()
        }
    };
    let request = Request::from_parts(parts, Full::new(bytes));

    dispatch(state, client_ip, request).await
}

/// Routes a buffered request through its pipeline to a handler.
///
/// Unknown routes still pass through the public chain, so they get
/// security headers and count against the standard rate budget before the
/// 404 envelope is written.
pub async fn dispatch(state: Arc<AppState>, client_ip: String, request: Request) -> Response {
    let mut ctx = RequestContext::new(client_ip);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let matched = state.router().match_route(&method, &path);

    match matched {
        Some(route) => {
            let operation = route.operation();
            ctx.set_path_params(route.into_params());

            tracing::debug!(
                request_id = %ctx.request_id(),
                operation = operation.name(),
                %method,
                path = %path,
                "dispatching request"
            );

            let pipeline = state.pipeline_for(operation);
            let handler_state = state.clone();
            pipeline
                .process(&mut ctx, request, move |ctx, _req| {
                    let input = HandlerInput::from_context(ctx);
                    Box::pin(
                        async move { handlers::dispatch(&handler_state, operation, input).await },
                    )
                })
                .await
        }
        None => {
            let pipeline = state.fallback_pipeline();
            pipeline
                .process(&mut ctx, request, move |_ctx, _req| {
                    Box::pin(async move {
                        Ok(envelope::from_http_error(&HttpError::with_code(
                            404,
                            ErrorCode::NotFound,
                            "The requested resource was not found",
                        )))
                    })
                })
                .await
        }
    }
}
