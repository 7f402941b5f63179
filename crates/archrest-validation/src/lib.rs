//! # Archrest Validation
//!
//! A small declarative schema library used to validate incoming requests and
//! to document them.
//!
//! - [`Schema`] - builder for `any`, `object`, `array`, `string`, `number`,
//!   `boolean`, `binary` and `date` schemas
//! - [`Description`] - the introspection form returned by [`Schema::describe`]
//! - [`ValidationSchema`] - per-route `headers` / `query` / `params` / `body` schemas
//! - [`ValidationStrategy`] / [`SchemaValidator`] - the engine seam used by the
//!   validation middleware
//!
//! ## Example
//!
//! ```
//! use archrest_validation::{Schema, ValidationOptions};
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .key("name", Schema::string().min(2).required())
//!     .key("age", Schema::number().integer());
//!
//! let ok = schema.validate(&json!({"name": "Ada", "age": "36"}), &ValidationOptions::default());
//! assert_eq!(ok.unwrap(), json!({"name": "Ada", "age": 36}));
//!
//! let err = schema.validate(&json!({"age": 3}), &ValidationOptions::default()).unwrap_err();
//! assert_eq!(err[0].kind, "any.required");
//! ```

#![doc(html_root_url = "https://docs.rs/archrest-validation/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod description;
mod error;
mod request;
mod schema;
mod validate;

pub use description::{DescribedRule, Description, DescriptionFlags, RuleArgs};
pub use error::SchemaError;
pub use regex::Regex;
pub use request::{RequestData, SchemaValidator, ValidationSchema, ValidationStrategy};
pub use schema::{Presence, Rule, Schema, SchemaType};
pub use validate::{PathSegment, ValidationErrorDetail, ValidationOptions};
