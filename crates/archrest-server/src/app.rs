//! The assembled application.

use crate::router::{MatchedRoute, Router, RouterStage};
use crate::sequence::SequencePlan;
use archrest_core::{Request, RequestContext, Response};
use archrest_docs::OpenApiDocument;
use archrest_middleware::{BoxedMiddleware, MiddlewareChain};
use archrest_telemetry::record_request;
use std::fmt;
use std::sync::Arc;

/// Route label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// A fully assembled request pipeline.
///
/// Setup middleware declared before the routes runs first, then the router,
/// then setup middleware declared after the routes, then a `404` fallback.
/// Built by [`RestServer::init`](crate::RestServer::init); can be driven
/// without a socket through [`App::handle`].
#[derive(Clone)]
pub struct App {
    chain: MiddlewareChain,
    router: Arc<Router>,
    document: Option<Arc<OpenApiDocument>>,
}

impl App {
    pub(crate) fn new(
        plan: SequencePlan,
        router: Router,
        document: Option<OpenApiDocument>,
    ) -> Self {
        let router = Arc::new(router);
        let mut stages: Vec<BoxedMiddleware> = plan.before_routes;
        stages.push(Arc::new(RouterStage::new(Arc::clone(&router))));
        stages.extend(plan.after_routes);

        Self {
            chain: MiddlewareChain::new(stages),
            router,
            document: document.map(Arc::new),
        }
    }

    /// Serves one request.
    pub async fn handle(&self, request: Request) -> Response {
        let mut ctx = RequestContext::from_request(&request);
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let response = self.chain.handle(&mut ctx, request).await;

        let status = response.status();
        let route = ctx
            .get_extension::<MatchedRoute>()
            .map_or(UNMATCHED_ROUTE, |matched| matched.pattern.as_str());
        record_request(method.as_str(), route, status.as_u16(), ctx.elapsed());
        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %method,
            path = %path,
            status = status.as_u16(),
            route,
            "Request completed"
        );

        response
    }

    /// The route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The synthesized OpenAPI document, when documentation is enabled.
    #[must_use]
    pub fn document(&self) -> Option<&OpenApiDocument> {
        self.document.as_deref()
    }

    /// Stage names of the application chain.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.chain.stage_names()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("stages", &self.chain.stage_names())
            .field("routes", &self.router.len())
            .field("document", &self.document.is_some())
            .finish()
    }
}
