//! # Archrest Docs
//!
//! OpenAPI 3.0 documents synthesized from controller metadata.
//!
//! This crate provides:
//! - **Path templates**: `:name` route paths rewritten to `{name}`
//! - **Schema translation**: validation schema descriptions mapped to JSON Schema
//! - **Synthesis**: one document covering every enabled route
//! - **Swagger UI**: an HTML page loading the served document
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use archrest_docs::{synthesize, SwaggerOptions, SwaggerUi};
//! use archrest_validation::Presence;
//!
//! let document = synthesize(&controllers, &store, &SwaggerOptions::default(), Presence::Required);
//! let json = document.to_json()?;
//! let page = SwaggerUi::new("/api-docs")?.html();
//! ```

mod annotations;
mod error;
mod openapi;
mod path;
mod schema;
mod swagger;
mod synthesize;

pub use annotations::{
    ApiKeyAuth, ApiKeyIn, Contact, ExternalDocs, HttpResponseSchema, Info, License,
    SecurityDefinitions, SecurityOptions, SecuritySelection, Server, SwaggerConfig,
    SwaggerOptions, Tag, TagDetails,
};
pub use error::{DocsError, DocsResult};
pub use openapi::{
    ComponentSchema, Components, MediaType, OpenApiDocument, Operation, Parameter, ParameterIn,
    RequestBody, ResponseObject, SchemaOrRef, SecurityScheme,
};
pub use path::{parse_path_template, ParsedPath, PathTemplateCache};
pub use schema::{
    schema_to_json_schema, ArraySchema, BooleanSchema, NumberSchema, ObjectSchema, SchemaNode,
    StringSchema,
};
pub use swagger::{DocExpansion, SwaggerUi};
pub use synthesize::synthesize;
