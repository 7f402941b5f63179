//! Guard stage.
//!
//! Runs the composed guards of a route. Only an [`GuardOutcome::Allow`] lets
//! the request continue. A denial carrying a response sends it; a denial
//! without one, or a failing guard, ends the request with an empty 500.

use crate::middleware::{Middleware, Next};
use archrest_core::{
    BoxFuture, GuardExecutor, GuardOutcome, Request, RequestContext, Response, ResponseExt,
};
use http::StatusCode;

/// Middleware running a method's guards.
#[derive(Debug, Clone)]
pub struct GuardStage {
    method_name: String,
    executor: GuardExecutor,
}

impl GuardStage {
    /// Creates the stage for controller method `method_name`.
    #[must_use]
    pub fn new(method_name: impl Into<String>, executor: GuardExecutor) -> Self {
        Self {
            method_name: method_name.into(),
            executor,
        }
    }

    fn fallback(&self) -> Response {
        tracing::warn!(
            method = %self.method_name,
            "a Guard on the method {} is terminating the request without a proper Response \
             handling, it will be handled as a 500 Error for now, return a Deny response \
             from the guard instead",
            self.method_name
        );
        Response::empty(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl Middleware for GuardStage {
    fn name(&self) -> &'static str {
        "guards"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match self.executor.run(ctx, &request).await {
                GuardOutcome::Allow => next.run(ctx, request).await,
                GuardOutcome::Deny(Some(response)) => response,
                GuardOutcome::Deny(None) => self.fallback(),
                GuardOutcome::Error(error) => {
                    tracing::error!(
                        method = %self.method_name,
                        error = %error,
                        "Error was thrown in a Guard on the method {}",
                        self.method_name
                    );
                    self.fallback()
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MiddlewareChain;
    use crate::stages::HandlerStage;
    use archrest_core::{handler_fn, ErrorRegistry, FnGuard, Guard};
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn chain(guards: Vec<Arc<dyn Guard>>, calls: Arc<AtomicUsize>) -> MiddlewareChain {
        let handler = handler_fn(move |_ctx, _req| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Response::empty(StatusCode::OK))
            }
        });
        MiddlewareChain::new(vec![
            Arc::new(GuardStage::new("find", GuardExecutor::new(guards))),
            Arc::new(HandlerStage::new("find", handler, Arc::new(ErrorRegistry::new()))),
        ])
    }

    #[tokio::test]
    async fn test_allow_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let allow: Arc<dyn Guard> = Arc::new(FnGuard::new(|_, _| GuardOutcome::Allow));
        let response = chain(vec![allow], Arc::clone(&calls))
            .handle(&mut RequestContext::new(), request())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deny_with_response() {
        let calls = Arc::new(AtomicUsize::new(0));
        let deny: Arc<dyn Guard> = Arc::new(FnGuard::new(|_, _| {
            GuardOutcome::Deny(Some(Response::empty(StatusCode::UNAUTHORIZED)))
        }));
        let response = chain(vec![deny], Arc::clone(&calls))
            .handle(&mut RequestContext::new(), request())
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_guard_error_gives_empty_500() {
        let calls = Arc::new(AtomicUsize::new(0));
        let allow: Arc<dyn Guard> = Arc::new(FnGuard::new(|_, _| GuardOutcome::Allow));
        let failing: Arc<dyn Guard> = Arc::new(FnGuard::new(|_, _| {
            GuardOutcome::Error(anyhow::anyhow!("token store unavailable"))
        }));
        let response = chain(vec![allow, failing], Arc::clone(&calls))
            .handle(&mut RequestContext::new(), request())
            .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deny_without_response_gives_500() {
        let calls = Arc::new(AtomicUsize::new(0));
        let deny: Arc<dyn Guard> = Arc::new(FnGuard::new(|_, _| GuardOutcome::Deny(None)));
        let response = chain(vec![deny], Arc::clone(&calls))
            .handle(&mut RequestContext::new(), request())
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
