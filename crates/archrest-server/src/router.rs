//! Route table and router adapter.
//!
//! Routes use the `:name` parameter syntax. A trailing `*` segment matches
//! whatever remains of the path. Matching walks the table in mount order and
//! the first route whose verb and path both match wins.
//!
//! ```rust
//! use archrest_core::HttpVerb;
//! use archrest_middleware::MiddlewareChain;
//! use archrest_server::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.mount_verb(HttpVerb::Get, "/users/:id", MiddlewareChain::default());
//!
//! let matched = router.match_route(&Method::GET, "/users/42").unwrap();
//! assert_eq!(matched.pattern(), "/users/:id");
//! assert_eq!(matched.params()["id"], "42");
//! assert!(router.match_route(&Method::POST, "/users/42").is_none());
//! ```

use archrest_core::{BoxFuture, HttpVerb, Request, RequestContext, Response};
use archrest_middleware::{Middleware, MiddlewareChain, Next};
use http::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

fn parse_segments(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "*" => Segment::Wildcard,
            _ => s.strip_prefix(':').map_or_else(
                || Segment::Literal(s.to_string()),
                |name| Segment::Param(name.to_string()),
            ),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct Route {
    verb: HttpVerb,
    pattern: String,
    segments: Vec<Segment>,
    chain: MiddlewareChain,
}

impl Route {
    fn match_path(&self, path: &str) -> Option<Map<String, Value>> {
        let mut actual = path.split('/').filter(|s| !s.is_empty());
        let mut params = Map::new();

        for segment in &self.segments {
            match segment {
                Segment::Wildcard => return Some(params),
                Segment::Literal(expected) => {
                    if actual.next()? != expected {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), Value::String(actual.next()?.to_string()));
                }
            }
        }

        actual.next().is_none().then_some(params)
    }
}

/// A route found by [`Router::match_route`].
#[derive(Debug)]
pub struct RouteMatch<'a> {
    route: &'a Route,
    params: Map<String, Value>,
}

impl<'a> RouteMatch<'a> {
    /// The chain serving the route.
    #[must_use]
    pub fn chain(&self) -> &'a MiddlewareChain {
        &self.route.chain
    }

    /// The mounted path pattern.
    #[must_use]
    pub fn pattern(&self) -> &'a str {
        &self.route.pattern
    }

    /// The verb the route was mounted under.
    #[must_use]
    pub fn verb(&self) -> HttpVerb {
        self.route.verb
    }

    /// Extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Takes the extracted path parameters.
    #[must_use]
    pub fn into_params(self) -> Map<String, Value> {
        self.params
    }
}

/// Ordered route table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts `chain` under an HTTP method.
    ///
    /// Methods without an [`HttpVerb`] counterpart are mounted for every verb.
    pub fn mount(&mut self, method: &Method, path: &str, chain: MiddlewareChain) {
        let verb = HttpVerb::from_method(method).unwrap_or_else(|| {
            tracing::debug!(method = %method, path, "Unknown HTTP method, mounting for all verbs");
            HttpVerb::All
        });
        self.mount_verb(verb, path, chain);
    }

    /// Mounts `chain` under `verb`.
    pub fn mount_verb(&mut self, verb: HttpVerb, path: &str, chain: MiddlewareChain) {
        tracing::info!("Register HTTP Route - {} {}", verb, path);
        self.routes.push(Route {
            verb,
            pattern: path.to_string(),
            segments: parse_segments(path),
            chain,
        });
    }

    /// Finds the first route matching `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .filter(|route| route.verb.matches(method))
            .find_map(|route| {
                route
                    .match_path(path)
                    .map(|params| RouteMatch { route, params })
            })
    }

    /// Mounted routes as `(verb, pattern)` pairs, in mount order.
    pub fn routes(&self) -> impl Iterator<Item = (HttpVerb, &str)> {
        self.routes
            .iter()
            .map(|route| (route.verb, route.pattern.as_str()))
    }

    /// Number of mounted routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Context extension naming the route that served a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    /// Verb the route was mounted under.
    pub verb: HttpVerb,
    /// Mounted path pattern.
    pub pattern: String,
}

/// Middleware dispatching to the matching route chain.
///
/// Unmatched requests continue with `next`; so does a matched route whose
/// chain never answers.
#[derive(Debug, Clone)]
pub struct RouterStage {
    router: Arc<Router>,
}

impl RouterStage {
    /// Wraps a route table.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// The route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}

impl Middleware for RouterStage {
    fn name(&self) -> &'static str {
        "router"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(matched) = self.router.match_route(request.method(), request.uri().path())
            else {
                return next.run(ctx, request).await;
            };

            let chain = matched.chain();
            ctx.set_extension(MatchedRoute {
                verb: matched.verb(),
                pattern: matched.pattern().to_string(),
            });
            ctx.set_params(matched.into_params());
            chain.run(ctx, request, next).await
        })
    }
}
