//! OpenAPI 3.0 document types.
//!
//! These types describe the synthesized document exactly as it is served.
//! Maps use [`IndexMap`] so serialization order follows insertion order and a
//! document built twice from the same metadata serializes identically.

use crate::annotations::{Info, Server, Tag};
use crate::error::DocsResult;
use crate::schema::SchemaNode;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// OpenAPI document root object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenApiDocument {
    /// OpenAPI version, always `3.0.0`.
    pub openapi: &'static str,
    /// Available servers.
    pub servers: Vec<Server>,
    /// API metadata.
    pub info: Info,
    /// One tag per controller.
    pub tags: Vec<Tag>,
    /// Reusable schemas and security schemes.
    pub components: Components,
    /// Operations by documented path, then by lower-case verb.
    pub paths: IndexMap<String, IndexMap<String, Operation>>,
}

impl OpenApiDocument {
    /// Serializes the document as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> DocsResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> DocsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Looks up an operation.
    #[must_use]
    pub fn operation(&self, path: &str, verb: &str) -> Option<&Operation> {
        self.paths.get(path).and_then(|verbs| verbs.get(verb))
    }
}

/// Reusable components.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Schemas referenced by operations.
    pub schemas: IndexMap<String, ComponentSchema>,
    /// Security schemes available to operations.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, SecurityScheme>,
}

/// A component schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComponentSchema {
    /// Derived from a validation schema.
    Derived(SchemaNode),
    /// Attached verbatim by a response annotation.
    Raw(Value),
}

impl ComponentSchema {
    /// The schema's `type`, if known.
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Self::Derived(node) => node.type_name(),
            Self::Raw(value) => value.get("type").and_then(Value::as_str),
        }
    }
}

/// A security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// HTTP authentication.
    #[serde(rename = "http", rename_all = "camelCase")]
    Http {
        /// `basic` or `bearer`.
        scheme: String,
        /// Bearer token format.
        #[serde(skip_serializing_if = "Option::is_none")]
        bearer_format: Option<String>,
    },
    /// API key authentication.
    #[serde(rename = "apiKey")]
    ApiKey {
        /// Header, query or cookie name.
        name: String,
        /// Where the key is sent.
        #[serde(rename = "in")]
        location: String,
    },
}

/// An API operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// `{verb}` or `{verb}-{prefix}`.
    pub operation_id: String,
    /// Short summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Full description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags for grouping.
    pub tags: Vec<String>,
    /// Path, query and header parameters.
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Security requirements.
    pub security: Vec<IndexMap<String, Vec<String>>>,
    /// Responses by status code.
    pub responses: IndexMap<String, ResponseObject>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// URL path parameter.
    Path,
    /// Query string parameter.
    Query,
    /// HTTP header.
    Header,
}

/// An operation parameter.
///
/// The parameter's schema attributes are flattened into the parameter itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Parameter schema.
    #[serde(flatten)]
    pub schema: SchemaNode,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    /// Whether a body is required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Content by media type.
    pub content: IndexMap<String, MediaType>,
}

/// Media type content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    /// Schema, inline or by reference.
    pub schema: SchemaOrRef,
}

/// An inline schema or a component reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    /// `{ "$ref": "#/components/schemas/..." }`.
    Ref {
        /// Reference target.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// `{ "type": "array", "items": { "$ref": ... } }`.
    RefArray {
        /// Always `array`.
        #[serde(rename = "type")]
        kind: &'static str,
        /// Item reference.
        items: Box<SchemaOrRef>,
    },
    /// An inline schema.
    Inline(SchemaNode),
}

impl SchemaOrRef {
    /// A reference to the component named `key`.
    #[must_use]
    pub fn component(key: &str) -> Self {
        Self::Ref {
            reference: format!("#/components/schemas/{key}"),
        }
    }

    /// An array of references to the component named `key`.
    #[must_use]
    pub fn component_array(key: &str) -> Self {
        Self::RefArray {
            kind: "array",
            items: Box::new(Self::component(key)),
        }
    }
}

/// A documented response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseObject {
    /// Description, empty when none was given.
    pub description: String,
    /// Content by media type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NumberSchema, SchemaNode};
    use serde_json::json;

    #[test]
    fn test_parameter_flattens_schema() {
        let parameter = Parameter {
            name: "id".to_string(),
            location: ParameterIn::Path,
            schema: SchemaNode::Number(NumberSchema {
                integer: true,
                required: Some(true),
                ..NumberSchema::default()
            }),
        };
        assert_eq!(
            serde_json::to_value(&parameter).unwrap(),
            json!({ "name": "id", "in": "path", "type": "integer", "required": true })
        );
    }

    #[test]
    fn test_security_scheme_shapes() {
        let bearer = SecurityScheme::Http {
            scheme: "bearer".to_string(),
            bearer_format: Some("JWT".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&bearer).unwrap(),
            json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" })
        );

        let key = SecurityScheme::ApiKey {
            name: "x-api-key".to_string(),
            location: "header".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            json!({ "type": "apiKey", "name": "x-api-key", "in": "header" })
        );
    }

    #[test]
    fn test_schema_refs() {
        assert_eq!(
            serde_json::to_value(SchemaOrRef::component_array("get-response")).unwrap(),
            json!({ "type": "array", "items": { "$ref": "#/components/schemas/get-response" } })
        );
    }
}
