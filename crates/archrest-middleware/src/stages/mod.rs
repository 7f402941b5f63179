//! Built-in middleware stages.
//!
//! A route chain always runs its stages in this order, skipping the ones a
//! route does not need:
//!
//! 1. [`guard`] - authentication guards
//! 2. [`upload`] - multipart file parsing
//! 3. controller middleware, then method middleware, as declared
//! 4. [`validation`] - request validation
//! 5. [`handler`] - the bound controller method
//!
//! [`body`] parsers are meant for application-wide setup middleware.

pub mod body;
pub mod guard;
pub mod handler;
pub mod upload;
pub mod validation;

pub use body::BodyParser;
pub use guard::GuardStage;
pub use handler::HandlerStage;
pub use upload::{UploadError, UploadStage};
pub use validation::ValidationStage;
