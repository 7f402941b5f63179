//! Route handlers bound to controller instances.

use crate::{BoxFuture, Request, RequestContext, Response};
use std::future::Future;
use std::sync::Arc;

/// What a route handler returns.
///
/// Errors are mapped to responses by the [`ErrorRegistry`](crate::ErrorRegistry).
pub type HandlerResult = Result<Response, anyhow::Error>;

/// The terminal stage of a route chain.
pub trait RouteHandler: Send + Sync + 'static {
    /// Handles the request.
    fn call(&self, ctx: RequestContext, request: Request) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> RouteHandler for F
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: Request) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx, request))
    }
}

/// A shared, type-erased route handler.
pub type BoxedHandler = Arc<dyn RouteHandler>;

/// Boxes a free function or closure as a handler.
pub fn handler_fn<F, Fut>(func: F) -> BoxedHandler
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(func)
}

/// Binds a controller method to its instance.
///
/// ```
/// use archrest_core::{bind, HandlerResult, Request, RequestContext, Response, ResponseExt};
/// use http::StatusCode;
/// use std::sync::Arc;
///
/// struct Health;
///
/// impl Health {
///     async fn check(self: Arc<Self>, _ctx: RequestContext, _req: Request) -> HandlerResult {
///         Ok(Response::text(StatusCode::OK, "ok"))
///     }
/// }
///
/// let handler = bind(Arc::new(Health), Health::check);
/// ```
pub fn bind<C, F, Fut>(instance: Arc<C>, method: F) -> BoxedHandler
where
    C: Send + Sync + 'static,
    F: Fn(Arc<C>, RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext, request: Request| {
        method(Arc::clone(&instance), ctx, request)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    struct Greeter {
        greeting: &'static str,
    }

    impl Greeter {
        async fn greet(self: Arc<Self>, ctx: RequestContext, _request: Request) -> HandlerResult {
            let name = ctx.param("name").unwrap_or("world").to_string();
            Ok(Response::text(StatusCode::OK, format!("{} {name}", self.greeting)))
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_bound_handler_uses_instance() {
        let handler = bind(Arc::new(Greeter { greeting: "hi" }), Greeter::greet);
        let response = handler.call(RequestContext::new(), request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_handler_fn_error() {
        let handler = handler_fn(|_ctx, _req| async { Err::<Response, _>(anyhow::anyhow!("boom")) });
        let err = handler.call(RequestContext::new(), request()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
