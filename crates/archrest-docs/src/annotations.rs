//! Documentation annotations and global swagger options.
//!
//! [`SwaggerConfig`] is attached to controllers and methods through the
//! metadata store. [`SwaggerOptions`] is server-wide and usually comes from
//! configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Documentation settings for a controller or a method.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwaggerConfig {
    /// Overrides whether the route is documented.
    pub enable: Option<bool>,
    /// Operation summary.
    pub summary: Option<String>,
    /// Operation description.
    pub description: Option<String>,
    /// Tag details merged into the controller's tag.
    pub tag: Option<TagDetails>,
    /// Documented responses.
    pub responses: Vec<HttpResponseSchema>,
    /// Security schemes this route uses.
    pub security: Option<SecuritySelection>,
}

impl SwaggerConfig {
    /// An empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables documentation of the route.
    #[must_use]
    pub fn enable(mut self, enable: bool) -> Self {
        self.enable = Some(enable);
        self
    }

    /// Sets the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the tag details.
    #[must_use]
    pub fn tag(mut self, tag: TagDetails) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Adds a documented response.
    #[must_use]
    pub fn response(mut self, response: HttpResponseSchema) -> Self {
        self.responses.push(response);
        self
    }

    /// Selects security schemes.
    #[must_use]
    pub fn security(mut self, security: SecuritySelection) -> Self {
        self.security = Some(security);
        self
    }
}

/// A documented response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponseSchema {
    /// Status code.
    pub status: u16,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// A raw JSON Schema for the response body.
    #[serde(default)]
    pub schema: Option<Value>,
    /// Wraps the schema in an array.
    #[serde(default)]
    pub is_array: bool,
}

impl HttpResponseSchema {
    /// A response with only a status.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            description: None,
            schema: None,
            is_array: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a body schema.
    #[must_use]
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Marks the body as an array of `schema`.
    #[must_use]
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }
}

/// Security schemes selected by a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySelection {
    /// Uses basic authentication.
    pub basic_auth: bool,
    /// Uses bearer authentication.
    pub bearer_auth: bool,
    /// API keys by name.
    pub api_keys_auth: Vec<String>,
}

/// API metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    /// API title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// API version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// API description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    /// License information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

/// Contact information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    /// Contact name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Contact email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// License information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// License name.
    pub name: String,
    /// License URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Server information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Tag details supplied by a controller annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagDetails {
    /// Tag description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// External documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

/// External documentation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDocs {
    /// Target URL.
    pub url: String,
    /// Link description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A document tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name: the controller prefix, or `base`.
    pub name: String,
    /// Details merged from the controller annotation.
    #[serde(flatten)]
    pub details: TagDetails,
}

/// Where an API key is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyIn {
    /// Query string.
    Query,
    /// Request header.
    #[default]
    Header,
    /// Cookie.
    Cookie,
}

impl ApiKeyIn {
    /// The OpenAPI location name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// An API key scheme definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyAuth {
    /// Key name, also used as the scheme name.
    pub key: String,
    /// Where the key is sent.
    #[serde(default, rename = "in")]
    pub location: ApiKeyIn,
}

/// Globally registered security schemes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityDefinitions {
    /// Registers `basicAuth`.
    pub basic_auth: bool,
    /// Registers `bearerAuth`.
    pub bearer_auth: bool,
    /// Registers one scheme per key.
    pub api_keys_auth: Vec<ApiKeyAuth>,
}

/// Global security settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityOptions {
    /// Registered schemes.
    pub definitions: SecurityDefinitions,
    /// Applies every registered scheme to routes that select none.
    pub enable_all_routes: bool,
}

/// Server-wide documentation options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwaggerOptions {
    /// API metadata.
    pub info: Info,
    /// Advertised servers.
    pub servers: Vec<Server>,
    /// Security schemes.
    pub security: Option<SecurityOptions>,
    /// Documents every route unless a controller or method opts out.
    /// Unset means enabled.
    pub enable_all_routes: Option<bool>,
}
