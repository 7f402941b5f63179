//! Terminal handler stage.

use crate::middleware::{Middleware, Next};
use archrest_core::{BoxFuture, BoxedHandler, ErrorRegistry, Request, RequestContext, Response};
use std::fmt;
use std::sync::Arc;

/// Middleware invoking a bound controller method.
///
/// Always terminal: it never calls `next`. Handler errors are rendered by the
/// error registry.
#[derive(Clone)]
pub struct HandlerStage {
    method_name: String,
    handler: BoxedHandler,
    errors: Arc<ErrorRegistry>,
}

impl HandlerStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(
        method_name: impl Into<String>,
        handler: BoxedHandler,
        errors: Arc<ErrorRegistry>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            handler,
            errors,
        }
    }
}

impl Middleware for HandlerStage {
    fn name(&self) -> &'static str {
        "handler"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        _next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            ctx.set_method_name(self.method_name.clone());
            match self.handler.call(ctx.clone(), request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(
                        method = %self.method_name,
                        request_id = %ctx.request_id(),
                        error = %error,
                        "Route handler returned an error"
                    );
                    self.errors.handle(&error)
                }
            }
        })
    }
}

impl fmt::Debug for HandlerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerStage")
            .field("method_name", &self.method_name)
            .finish_non_exhaustive()
    }
}
