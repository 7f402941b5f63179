//! # Archrest Server
//!
//! Controller registration, routing and the HTTP server lifecycle.
//!
//! - [`ControllerBuilder`] / [`RouteBuilder`] - declare controllers and write
//!   their annotations into the metadata store
//! - [`build_chain`] - build a route's middleware chain in the fixed stage order
//! - [`Router`] - mount chains and match requests
//! - [`Sequence`] - order setup middleware around the routes
//! - [`RestServer`] / [`App`] - assemble, serve and shut down
//!
//! ## Example
//!
//! ```rust
//! use archrest_core::{handler_fn, Response, ResponseExt};
//! use archrest_middleware::BodyParser;
//! use archrest_server::{ControllerBuilder, RestServer, RouteBuilder, Sequence};
//! use bytes::Bytes;
//! use http::StatusCode;
//! use http_body_util::Full;
//!
//! struct Greeter;
//!
//! # tokio_test::block_on(async {
//! let app = RestServer::builder()
//!     .sequence(
//!         Sequence::new()
//!             .middleware(BodyParser::json())
//!             .register_routes()
//!             .start_listening(),
//!     )
//!     .controller(
//!         ControllerBuilder::new::<Greeter>()
//!             .prefix("greet")
//!             .route(RouteBuilder::get("/:name", "greet", handler_fn(|ctx, _req| async move {
//!                 let name = ctx.param("name").unwrap_or("stranger").to_string();
//!                 Ok(Response::text(StatusCode::OK, format!("hello {name}")))
//!             }))),
//!     )
//!     .build()
//!     .init()
//!     .unwrap();
//!
//! let request = http::Request::get("/greet/ada").body(Full::new(Bytes::new())).unwrap();
//! let response = app.handle(request).await;
//! assert_eq!(response.status(), StatusCode::OK);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/archrest-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod controller;
mod declare;
mod error;
pub mod router;
mod sequence;
mod server;
pub mod shutdown;

pub use app::{App, UNMATCHED_ROUTE};
pub use controller::{build_chain, ChainSettings};
pub use declare::{auth_guard, ControllerBuilder, RouteBuilder};
pub use error::{ServerError, ServerResult};
pub use router::{MatchedRoute, RouteMatch, Router, RouterStage};
pub use sequence::{Sequence, SequenceMarker, SequencePlan, SetupStep};
pub use server::{init_logging, RestServer, RestServerBuilder, RunningServer};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
