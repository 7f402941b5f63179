//! Ordered middleware chains.
//!
//! A [`MiddlewareChain`] is built once per route and never changes afterwards.
//! Running it folds its stages onto a tail continuation, so a route chain can
//! hand over to whatever follows it in the application when no stage answers.

use crate::middleware::{Middleware, Next};
use archrest_core::{Request, RequestContext, Response, ResponseExt};
use http::StatusCode;
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of middleware.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    stages: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates a chain from stages in execution order.
    #[must_use]
    pub fn new(stages: Vec<BoxedMiddleware>) -> Self {
        Self { stages }
    }

    /// The stages, in execution order.
    #[must_use]
    pub fn stages(&self) -> &[BoxedMiddleware] {
        &self.stages
    }

    /// Stage names, in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Links the stages in front of `tail`.
    pub fn link<'a>(&'a self, tail: Next<'a>) -> Next<'a> {
        self.stages
            .iter()
            .rev()
            .fold(tail, |next, stage| Next::new(stage.as_ref(), next))
    }

    /// Runs the chain, continuing with `tail` if the last stage calls `next`.
    pub async fn run<'a>(
        &'a self,
        ctx: &mut RequestContext,
        request: Request,
        tail: Next<'a>,
    ) -> Response {
        self.link(tail).run(ctx, request).await
    }

    /// Runs the chain, answering 404 if every stage continues.
    pub async fn handle(&self, ctx: &mut RequestContext, request: Request) -> Response {
        self.run(ctx, request, not_found()).await
    }
}

/// A terminal continuation answering `404 { "error": "Not Found" }`.
#[must_use]
pub fn not_found<'a>() -> Next<'a> {
    Next::terminal(|_ctx, _request| {
        Box::pin(async {
            Response::json(StatusCode::NOT_FOUND, &json!({ "error": "Not Found" }))
        })
    })
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl FromIterator<BoxedMiddleware> for MiddlewareChain {
    fn from_iter<I: IntoIterator<Item = BoxedMiddleware>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnMiddleware;
    use bytes::Bytes;
    use http_body_util::Full;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<&'static str>>>);

    impl Recorder {
        fn push(&self, name: &'static str) {
            self.0.lock().unwrap().push(name);
        }

        fn take(&self) -> Vec<&'static str> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn recording(name: &'static str, recorder: &Recorder) -> BoxedMiddleware {
        let recorder = recorder.clone();
        Arc::new(FnMiddleware::new(name, move |ctx, request, next| {
            recorder.push(name);
            Box::pin(async move { next.run(ctx, request).await })
        }))
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_runs_in_order_then_not_found() {
        let recorder = Recorder::default();
        let chain = MiddlewareChain::new(vec![
            recording("a", &recorder),
            recording("b", &recorder),
            recording("c", &recorder),
        ]);

        let mut ctx = RequestContext::new();
        let response = chain.handle(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(recorder.take(), vec!["a", "b", "c"]);
        assert_eq!(chain.stage_names(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_repeated_middleware_runs_each_time() {
        let recorder = Recorder::default();
        let shared = recording("shared", &recorder);
        let chain: MiddlewareChain = vec![Arc::clone(&shared), shared].into_iter().collect();

        let mut ctx = RequestContext::new();
        chain.handle(&mut ctx, request()).await;
        assert_eq!(recorder.take(), vec!["shared", "shared"]);
    }

    #[tokio::test]
    async fn test_continues_with_tail() {
        let chain = MiddlewareChain::default();
        let tail = Next::terminal(|_ctx, _req| {
            Box::pin(async { Response::empty(StatusCode::ACCEPTED) })
        });
        let mut ctx = RequestContext::new();
        let response = chain.run(&mut ctx, request(), tail).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
