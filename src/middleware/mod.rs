//! Middleware pipeline — composable before/after request handler logic.
//!
//! This module defines the core types for building an ordered middleware stack.
//! Each middleware wraps the next layer, enabling request inspection,
//! short-circuit responses, and response decoration without coupling handlers
//! to infrastructure concerns.
//!
//! ## Core types
//!
//! - [`Middleware`] — trait implemented by all middleware.
//! - [`Next`] — cursor into the remaining middleware chain; call [`Next::run`]
//!   to advance to the next layer.
//! - [`MiddlewareHandler`] — type-erased, cheaply-cloneable middleware function.
//! - [`from_middleware`] — converts a [`Middleware`] trait object into a
//!   [`MiddlewareHandler`].
//! - [`LoggerMiddleware`] — built-in request/response logger.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio::time::Instant;

use crate::{Response, context::Context};

/// A cursor into the remaining middleware chain for a single request.
///
/// `Next` is passed to each middleware's [`Middleware::handle`] implementation.
/// Calling [`Next::run`] advances the cursor by one position and invokes the
/// next middleware (or returns a fallback `500` response when the chain is
/// exhausted without any middleware generating a response).
///
/// `Next` is consumed on each call to [`run`](Self::run), so it cannot be
/// called more than once per middleware invocation.
///
/// # Examples
///
/// ```rust,no_run
/// use std::pin::Pin;
/// use platter::{Response, context::Context, middleware::{Middleware, Next}};
///
/// struct PassThrough;
///
/// impl Middleware for PassThrough {
///     fn handle(
///         &self,
///         ctx: Context,
///         next: Next,
///     ) -> Pin<Box<dyn std::future::Future<Output = Response> + Send>> {
///         Box::pin(async move { next.run(ctx).await })
///     }
/// }
/// ```
pub struct Next {
    middlewares: Vec<MiddlewareHandler>,
    // Tracks which middleware to invoke on the next `run` call.
    index: usize,
}

/// A type-erased, reference-counted middleware function.
///
/// Every entry in the middleware stack is stored as a `MiddlewareHandler`.
/// The [`Arc`] wrapper makes handlers cheap to clone so that [`Next`] can
/// advance through the chain without copying closures.
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use platter::middleware::{LoggerMiddleware, from_middleware};
///
/// let handler = from_middleware(Arc::new(LoggerMiddleware));
/// ```
pub fn from_middleware<M>(middleware: Arc<M>) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

impl Next {
    /// Creates a new `Next` positioned at the start of the given middleware stack.
    pub fn new(middlewares: Vec<MiddlewareHandler>) -> Self {
        Self {
            middlewares,
            index: 0,
        }
    }

    /// Invokes the next middleware in the chain and returns its response.
    ///
    /// Advances the internal cursor by one, clones the handler at the current
    /// position, and awaits it. If no handler remains (i.e. the chain is
    /// exhausted without producing a response), a `500 Internal Server Error`
    /// response is returned as a safe fallback.
    pub async fn run(mut self, ctx: Context) -> Response {
        if self.index < self.middlewares.len() {
            let handler = self.middlewares[self.index].clone();
            self.index += 1;
            handler(ctx, self).await
        } else {
            Response::new(crate::StatusCode::InternalServerError)
                .body("No response generated by middleware pipeline")
        }
    }
}

/// The core trait for all platter middleware.
///
/// Implementors receive a [`Context`] and a [`Next`] cursor. They may:
///
/// - **Pass through** — call `next.run(ctx).await` without modification.
/// - **Short-circuit** — return a [`Response`] directly without calling `next`.
/// - **Decorate** — call `next.run(ctx).await`, inspect the response, and
///   return a modified copy.
///
/// # Contract
///
/// - Implementations **must** be `Send + Sync` because middleware is shared
///   across Tokio tasks.
/// - `handle` **must** return a pinned, `Send` future so it can be awaited
///   across `.await` points in multi-threaded runtimes.
pub trait Middleware: Send + Sync {
    /// Handles the request and optionally delegates to the next middleware.
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// Built-in middleware that logs each request's method, path, status, and duration.
///
/// Emits a single `tracing::info!` line after the downstream handler
/// completes, in the format:
///
/// ```text
/// METHOD /path - STATUS (duration)
/// ```
///
/// `LoggerMiddleware` does not short-circuit; it always delegates to the next
/// middleware and decorates the response timing after the fact.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method();
            let path = ctx.request().path().to_string();

            let response = next.run(ctx).await;

            let duration = start.elapsed();
            let status = response.status().as_u16();

            tracing::info!("{} {} - {} ({:?})", method, path, status, duration);

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ParseStatus, Request, RequestParser, StatusCode};

    fn ctx_for(raw: &[u8]) -> Context {
        let mut request = Request::new();
        let mut parser = RequestParser::new(&mut request);
        assert_eq!(parser.parse(raw), ParseStatus::Finished);
        drop(parser);
        Context::new(request)
    }

    #[tokio::test]
    async fn exhausted_chain_falls_back_to_500() {
        let next = Next::new(vec![]);
        let response = next.run(ctx_for(b"GET / HTTP/1.1\r\n\r\n")).await;
        assert_eq!(response.status(), StatusCode::InternalServerError);
    }

    #[tokio::test]
    async fn chain_runs_in_order() {
        let first: MiddlewareHandler = Arc::new(|ctx, next| {
            Box::pin(async move {
                let mut response = next.run(ctx).await;
                response.add_header("X-Order", "first");
                response
            })
        });
        let second: MiddlewareHandler = Arc::new(|_ctx, _next| {
            Box::pin(async { Response::new(StatusCode::Ok) })
        });

        let next = Next::new(vec![first, second]);
        let response = next.run(ctx_for(b"GET / HTTP/1.1\r\n\r\n")).await;
        assert_eq!(response.status(), StatusCode::Ok);

        let bytes = response.into_bytes();
        assert!(
            std::str::from_utf8(&bytes)
                .unwrap()
                .contains("X-Order: first\r\n")
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_downstream() {
        let gate: MiddlewareHandler = Arc::new(|_ctx, _next| {
            Box::pin(async { Response::new(StatusCode::Unauthorized) })
        });
        let downstream: MiddlewareHandler = Arc::new(|_ctx, _next| {
            Box::pin(async { Response::new(StatusCode::Ok) })
        });

        let next = Next::new(vec![gate, downstream]);
        let response = next.run(ctx_for(b"GET / HTTP/1.1\r\n\r\n")).await;
        assert_eq!(response.status(), StatusCode::Unauthorized);
    }

    #[tokio::test]
    async fn logger_passes_response_through() {
        let logger = from_middleware(Arc::new(LoggerMiddleware));
        let terminal: MiddlewareHandler = Arc::new(|_ctx, _next| {
            Box::pin(async { Response::new(StatusCode::Created) })
        });

        let next = Next::new(vec![logger, terminal]);
        let response = next.run(ctx_for(b"GET /logged HTTP/1.1\r\n\r\n")).await;
        assert_eq!(response.status(), StatusCode::Created);
    }
}
