//! Core middleware trait and the stage outcome.
//!
//! Every guard stage implements [`Middleware`]. A stage receives the mutable
//! request context and the request, and resolves to exactly one
//! [`Outcome`]: pass the (possibly modified) request onward, or terminate
//! the chain with a response. There is no way to do both, which is what
//! makes a double-written response unrepresentable.

use std::future::Future;
use std::pin::Pin;

use crate::context::RequestContext;
use crate::types::{Request, Response};

/// A boxed future, as returned by stage implementations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The tri-state result of running one stage.
#[derive(Debug)]
pub enum Outcome {
    /// The stage passed; hand the request to the next stage.
    Continue(Request),
    /// The stage short-circuited with a terminal response.
    Respond(Response),
}

/// A single stage in the request pipeline.
///
/// # Invariants
///
/// - A stage resolves to exactly one `Outcome` per request.
/// - A stage that rejects a request builds the full failure envelope itself;
///   nothing downstream runs after a `Respond`.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the stage name used in logs.
    fn name(&self) -> &'static str;

    /// Runs this stage.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Outcome>;
}

/// A stage built from an async function, mostly useful in tests.
pub struct FnStage<F> {
    name: &'static str,
    func: F,
}

impl<F> FnStage<F> {
    /// Creates a function-backed stage.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F, Fut> Middleware for FnStage<F>
where
    F: Fn(&mut RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin((self.func)(ctx, request))
    }
}
