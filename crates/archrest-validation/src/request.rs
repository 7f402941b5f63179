//! Request-level validation.

use crate::{PathSegment, Schema, ValidationErrorDetail, ValidationOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schemas for the parts of a request.
///
/// Only declared sections are validated.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    /// Request headers, keyed by lower-case name.
    pub headers: Option<Schema>,
    /// Query string values.
    pub query: Option<Schema>,
    /// Path parameters.
    pub params: Option<Schema>,
    /// Request body.
    pub body: Option<Schema>,
}

impl ValidationSchema {
    /// An empty schema set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the headers schema.
    #[must_use]
    pub fn headers(mut self, schema: Schema) -> Self {
        self.headers = Some(schema);
        self
    }

    /// Sets the query schema.
    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Sets the path parameters schema.
    #[must_use]
    pub fn params(mut self, schema: Schema) -> Self {
        self.params = Some(schema);
        self
    }

    /// Sets the body schema.
    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }
}

/// The request parts handed to a validation strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    /// Path parameters.
    pub params: Value,
    /// Headers.
    pub headers: Value,
    /// Query string values.
    pub query: Value,
    /// Body, absent when no body parser produced one.
    pub body: Option<Value>,
}

/// A request validation engine.
pub trait ValidationStrategy: Send + Sync + 'static {
    /// Validates `data`, returning it with conversions and defaults applied.
    fn validate(
        &self,
        schema: &ValidationSchema,
        data: RequestData,
    ) -> Result<RequestData, Vec<ValidationErrorDetail>>;
}

/// The built-in strategy backed by [`Schema::validate`].
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    options: ValidationOptions,
}

impl SchemaValidator {
    /// Creates a validator with the given options.
    #[must_use]
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// The engine options.
    #[must_use]
    pub const fn options(&self) -> &ValidationOptions {
        &self.options
    }
}

impl ValidationStrategy for SchemaValidator {
    fn validate(
        &self,
        schema: &ValidationSchema,
        mut data: RequestData,
    ) -> Result<RequestData, Vec<ValidationErrorDetail>> {
        let mut errors = Vec::new();

        let sections: [(&str, Option<&Schema>); 4] = [
            ("params", schema.params.as_ref()),
            ("headers", schema.headers.as_ref()),
            ("query", schema.query.as_ref()),
            ("body", schema.body.as_ref()),
        ];

        for (name, section) in sections {
            let Some(section) = section else { continue };
            let path = [PathSegment::Key(name.to_string())];
            let current = match name {
                "params" => Some(&data.params),
                "headers" => Some(&data.headers),
                "query" => Some(&data.query),
                _ => data.body.as_ref(),
            };

            match section.validate_at(current, &path, &self.options) {
                Ok(validated) => match name {
                    "params" => data.params = validated.unwrap_or(Value::Null),
                    "headers" => data.headers = validated.unwrap_or(Value::Null),
                    "query" => data.query = validated.unwrap_or(Value::Null),
                    _ => data.body = validated,
                },
                Err(mut section_errors) => {
                    errors.append(&mut section_errors);
                    if self.options.abort_early {
                        break;
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            tracing::debug!(errors = errors.len(), "Request failed validation");
            Err(errors)
        }
    }
}
