//! # Archrest Middleware
//!
//! Route middleware chains for Archrest.
//!
//! Every route is served by a [`MiddlewareChain`] whose stages run one after
//! another, each deciding whether to continue with [`Next`]. The built-in
//! stages in [`stages`] cover guards, multipart uploads, request validation,
//! the terminal route handler, and body parsing for setup middleware.

#![doc(html_root_url = "https://docs.rs/archrest-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod stages;

pub use archrest_core::{BoxFuture, Request, RequestContext, Response, ResponseExt};
pub use chain::{BoxedMiddleware, MiddlewareChain};
pub use middleware::{FnMiddleware, Middleware, Next};
pub use stages::{
    BodyParser, GuardStage, HandlerStage, UploadError, UploadStage, ValidationStage,
};
