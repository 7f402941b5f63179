//! # Archrest
//!
//! A REST layer for controller-based applications:
//!
//! - controllers declared with explicit builders, each route served by a
//!   middleware chain in a fixed order (guards, file upload, controller
//!   middleware, method middleware, validation, handler)
//! - a declarative validation schema library
//! - an OpenAPI 3.0 document synthesized from the same metadata that drives
//!   routing, with a Swagger UI page
//! - a hyper-based server with a setup sequence and graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use archrest::prelude::*;
//! use std::sync::Arc;
//!
//! struct UsersController;
//!
//! impl UsersController {
//!     async fn find(self: Arc<Self>, ctx: RequestContext, _req: Request) -> HandlerResult {
//!         let id = ctx.params()["id"].clone();
//!         Ok(Response::json(StatusCode::OK, &serde_json::json!({ "id": id })))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("archrest.toml")?
//!         .with_default_env()
//!         .load()?;
//!     archrest::server::init_logging(&config)?;
//!
//!     let users = Arc::new(UsersController);
//!     RestServer::from_config(&config)?
//!         .controller(
//!             ControllerBuilder::new::<UsersController>()
//!                 .prefix("users")
//!                 .route(
//!                     RouteBuilder::get("/:id", "find", bind(users, UsersController::find))
//!                         .validate(ValidationSchema::new().params(
//!                             Schema::object().key("id", Schema::number().integer()),
//!                         )),
//!                 ),
//!         )
//!         .validation_options(ValidationOptions::default())
//!         .build()
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! setup middleware (before routes) → router → route chain → setup middleware (after routes) → 404
//!                                             │
//!                                             guards → upload → controller mw → method mw → validation → handler
//! ```

#![doc(html_root_url = "https://docs.rs/archrest/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use archrest_config as config;
pub use archrest_core as core;
pub use archrest_docs as docs;
pub use archrest_middleware as middleware;
pub use archrest_server as server;
pub use archrest_telemetry as telemetry;
pub use archrest_validation as validation;

/// Prelude module for convenient imports.
///
/// ```rust
/// use archrest::prelude::*;
/// ```
pub mod prelude {
    pub use archrest_core::{
        bind, handler_fn, BoxFuture, ClassId, ErrorRegistry, FileUploadOptions, FileUploadSpec,
        FnGuard, Guard, GuardInfo, GuardOutcome, HandlerResult, HttpError, HttpVerb,
        MetadataStore, Request, RequestContext, Response, ResponseExt,
    };

    pub use archrest_validation::{Presence, Schema, ValidationOptions, ValidationSchema};

    pub use archrest_middleware::{BodyParser, FnMiddleware, Middleware, Next};

    pub use archrest_docs::{HttpResponseSchema, SwaggerConfig, SwaggerOptions};

    pub use archrest_config::{ConfigLoader, RestConfig};

    pub use archrest_server::{
        auth_guard, App, ControllerBuilder, RestServer, RouteBuilder, Sequence, ServerError,
        ShutdownSignal,
    };

    pub use http::StatusCode;
}
