//! Core middleware trait and types.
//!
//! A middleware receives the mutable [`RequestContext`], the request and a
//! [`Next`] continuation. Calling `next.run` hands the request to the rest of
//! the chain; returning a response without calling it short-circuits.
//!
//! # Example
//!
//! ```
//! use archrest_middleware::{BoxFuture, Middleware, Next, Request, RequestContext, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use archrest_core::{BoxFuture, Request, RequestContext, Response};

/// A request-processing stage.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs and chain introspection.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// Continuation to the rest of a chain.
///
/// Consumed by [`run`](Next::run), so it can be invoked at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Terminal(
        Box<dyn FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a>,
    ),
}

impl<'a> Next<'a> {
    /// A continuation that runs `middleware`, then `next`.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// A terminal continuation.
    pub fn terminal<F>(f: F) -> Self
    where
        F: FnOnce(&mut RequestContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Terminal(Box::new(f)),
        }
    }

    /// Invokes the rest of the chain.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Terminal(terminal) => terminal(ctx, request).await,
        }
    }
}

/// A middleware backed by a closure.
///
/// ```
/// use archrest_middleware::FnMiddleware;
///
/// let tag = FnMiddleware::new("tag", |ctx, request, next| {
///     Box::pin(async move {
///         ctx.set_extension("tagged");
///         next.run(ctx, request).await
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Wraps a closure.
    pub fn new(name: &'static str, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Request, Next<'a>) -> BoxFuture<'a, Response>
            + Send
            + Sync
            + 'static,
    {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archrest_core::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    struct Visit(&'static str);

    impl Middleware for Visit {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut RequestContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut visited = ctx.get_extension::<Vec<&'static str>>().cloned().unwrap_or_default();
                visited.push(self.0);
                ctx.set_extension(visited);
                next.run(ctx, request).await
            })
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok() -> Next<'static> {
        Next::terminal(|_ctx, _req| Box::pin(async { Response::empty(StatusCode::OK) }))
    }

    #[tokio::test]
    async fn test_terminal() {
        let mut ctx = RequestContext::new();
        let response = ok().run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chain_order() {
        let first = Visit("first");
        let second = Visit("second");
        let mut ctx = RequestContext::new();

        let next = Next::new(&first, Next::new(&second, ok()));
        let response = next.run(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            ctx.get_extension::<Vec<&'static str>>().unwrap(),
            &vec!["first", "second"]
        );
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuit() {
        let deny = FnMiddleware::new("deny", |_ctx, _req, _next| {
            Box::pin(async { Response::empty(StatusCode::FORBIDDEN) })
        });
        assert_eq!(deny.name(), "deny");

        let mut ctx = RequestContext::new();
        let response = Next::new(&deny, ok()).run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
