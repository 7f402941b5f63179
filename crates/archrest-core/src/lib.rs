//! # Archrest Core
//!
//! Core types shared by every Archrest crate.
//!
//! - [`MetadataStore`] - class and method scoped annotation storage
//! - [`HttpVerb`] / [`RouteInfo`] - declared routes and prefix resolution
//! - [`ControllerInfo`] / [`MethodInfo`] / [`GuardInfo`] - the controller model
//!   handed over by the host application
//! - [`Guard`] / [`GuardOutcome`] / [`compose_guards`] - authentication guard composition
//! - [`RequestContext`] - per-request state flowing through a middleware chain
//! - [`HttpError`] / [`ErrorRegistry`] - route handler error mapping

#![doc(html_root_url = "https://docs.rs/archrest-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod controller;
mod error;
mod guard;
mod handler;
pub mod metadata;
mod registry;
mod route;
mod types;
mod upload;
mod verb;

pub use context::{parse_query, RequestContext, RequestId};
pub use controller::{ControllerInfo, MethodInfo};
pub use error::HttpError;
pub use guard::{compose_guards, FnGuard, Guard, GuardExecutor, GuardInfo, GuardOutcome};
pub use handler::{bind, handler_fn, BoxedHandler, HandlerResult, RouteHandler};
pub use metadata::{ClassId, MetadataKey, MetadataStore, OwnerId};
pub use registry::{ErrorRegistry, HttpErrorsOptions};
pub use route::{join_route_path, normalize_route_path, resolve_prefix, RouteInfo};
pub use types::{BoxFuture, Request, Response, ResponseExt};
pub use upload::{
    FileUploadOptions, FileUploadSpec, UploadFields, UploadedFile, DEFAULT_UPLOAD_DIR,
};
pub use verb::{HttpVerb, UnknownVerb};
