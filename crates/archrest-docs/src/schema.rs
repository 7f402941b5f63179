//! Translation of schema descriptions into JSON Schema.
//!
//! [`schema_to_json_schema`] walks a [`Description`] tree and produces a
//! [`SchemaNode`] for each node. Objects, arrays, strings (including binary
//! and date), numbers and booleans each get their own variant; any other type
//! becomes the empty schema `{}`. The translation never fails.
//!
//! Every produced node carries a `required` flag. A node's own presence wins;
//! otherwise the ambient presence decides.

use archrest_validation::{Description, Presence};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Number, Value};

/// A JSON Schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// `type: object`.
    Object(ObjectSchema),
    /// `type: array`.
    Array(ArraySchema),
    /// `type: string`.
    String(StringSchema),
    /// `type: number` or `type: integer`.
    Number(NumberSchema),
    /// `type: boolean`.
    Boolean(BooleanSchema),
    /// The empty schema `{}`.
    Empty,
}

/// Object schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    /// Child schemas by key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    /// Maximum key count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<Number>,
    /// Minimum key count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<Number>,
    /// Presence flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// Array schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArraySchema {
    /// Item schema.
    pub items: Box<SchemaNode>,
    /// Maximum item count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<Number>,
    /// Minimum item count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<Number>,
    /// Presence flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Set when items must be distinct.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

/// String schema, also used for binary and date values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringSchema {
    /// Maximum length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Number>,
    /// Minimum length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<Number>,
    /// Presence flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    /// Format hint, e.g. `email`, `uuid`, `binary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Regex source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Number schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberSchema {
    /// Emits `type: integer` instead of `type: number`.
    #[serde(skip)]
    pub integer: bool,
    /// Upper bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// Lower bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// Presence flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
}

/// Boolean schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanSchema {
    /// Presence flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Default value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Allowed values.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
}

impl SchemaNode {
    /// A plain string schema with the given presence flag.
    #[must_use]
    pub fn string(required: bool) -> Self {
        Self::String(StringSchema {
            required: Some(required),
            ..StringSchema::default()
        })
    }

    /// The emitted `type`, or `None` for the empty schema.
    #[must_use]
    pub const fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::Object(_) => Some("object"),
            Self::Array(_) => Some("array"),
            Self::String(_) => Some("string"),
            Self::Number(number) if number.integer => Some("integer"),
            Self::Number(_) => Some("number"),
            Self::Boolean(_) => Some("boolean"),
            Self::Empty => None,
        }
    }

    /// Returns `true` for object and array schemas.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Array(_))
    }

    /// The presence flag, if the node has one.
    #[must_use]
    pub const fn required(&self) -> Option<bool> {
        match self {
            Self::Object(schema) => schema.required,
            Self::Array(schema) => schema.required,
            Self::String(schema) => schema.required,
            Self::Number(schema) => schema.required,
            Self::Boolean(schema) => schema.required,
            Self::Empty => None,
        }
    }

    /// Replaces the presence flag. No-op for the empty schema.
    pub fn set_required(&mut self, required: Option<bool>) {
        match self {
            Self::Object(schema) => schema.required = required,
            Self::Array(schema) => schema.required = required,
            Self::String(schema) => schema.required = required,
            Self::Number(schema) => schema.required = required,
            Self::Boolean(schema) => schema.required = required,
            Self::Empty => {}
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Typed<'a, T> {
            #[serde(rename = "type")]
            kind: &'static str,
            #[serde(flatten)]
            inner: &'a T,
        }

        match (self.type_name(), self) {
            (Some(kind), Self::Object(inner)) => Typed { kind, inner }.serialize(serializer),
            (Some(kind), Self::Array(inner)) => Typed { kind, inner }.serialize(serializer),
            (Some(kind), Self::String(inner)) => Typed { kind, inner }.serialize(serializer),
            (Some(kind), Self::Number(inner)) => Typed { kind, inner }.serialize(serializer),
            (Some(kind), Self::Boolean(inner)) => Typed { kind, inner }.serialize(serializer),
            _ => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

const FORMATS: [(&str, &str); 5] = [
    ("dataUri", "uri"),
    ("base64", "byte"),
    ("email", "email"),
    ("guid", "uuid"),
    ("hostname", "hostname"),
];

/// Common attributes read off a description node.
struct Attributes {
    required: bool,
    default: Option<Value>,
    description: Option<String>,
    example: Option<Value>,
}

impl Attributes {
    fn read(description: &Description, presence: Presence) -> Self {
        let flags = description.flags.as_ref();
        let effective = description.presence().unwrap_or(presence);
        Self {
            required: effective == Presence::Required,
            default: flags.and_then(|flags| flags.default.clone()),
            description: flags.and_then(|flags| flags.description.clone()),
            example: description.examples.first().cloned(),
        }
    }

    fn default_if(&self, accept: fn(&Value) -> bool) -> Option<Value> {
        self.default.clone().filter(|value| accept(value))
    }

    fn example_if(&self, accept: fn(&Value) -> bool) -> Option<Value> {
        self.example.clone().filter(|value| accept(value))
    }
}

fn limit(description: &Description, rule: &str) -> Option<Number> {
    description
        .rule(rule)
        .and_then(|rule| rule.args.as_ref())
        .and_then(|args| match &args.limit {
            Some(Value::Number(number)) => Some(number.clone()),
            _ => None,
        })
}

fn pattern(description: &Description) -> Option<String> {
    description
        .rule("pattern")
        .and_then(|rule| rule.args.as_ref())
        .and_then(|args| args.regex.clone())
}

/// Translates a description into a JSON Schema node.
///
/// `presence` is the ambient presence mode applied to nodes that do not
/// declare their own.
///
/// ```
/// use archrest_docs::schema_to_json_schema;
/// use archrest_validation::{Presence, Schema};
///
/// let description = Schema::number().integer().min(1).describe();
/// let node = schema_to_json_schema(&description, Presence::Required);
/// assert_eq!(
///     serde_json::to_value(&node).unwrap(),
///     serde_json::json!({ "type": "integer", "minimum": 1, "required": true }),
/// );
/// ```
#[must_use]
pub fn schema_to_json_schema(description: &Description, presence: Presence) -> SchemaNode {
    let attributes = Attributes::read(description, presence);

    match description.schema_type.as_str() {
        "object" => SchemaNode::Object(ObjectSchema {
            properties: description.keys.as_ref().map(|keys| {
                keys.iter()
                    .map(|(key, child)| (key.clone(), schema_to_json_schema(child, presence)))
                    .collect()
            }),
            max_properties: limit(description, "max"),
            min_properties: limit(description, "min"),
            required: Some(attributes.required),
            default: attributes.default_if(Value::is_object),
            description: attributes.description.clone(),
            example: attributes.example_if(Value::is_object),
        }),
        "array" => SchemaNode::Array(ArraySchema {
            items: Box::new(
                description
                    .items
                    .first()
                    .map_or(SchemaNode::Empty, |item| schema_to_json_schema(item, presence)),
            ),
            max_items: limit(description, "max"),
            min_items: limit(description, "min"),
            required: Some(attributes.required),
            default: attributes.default_if(Value::is_array),
            description: attributes.description.clone(),
            example: attributes.example_if(Value::is_array),
            unique_items: description.rule("unique").map(|_| true),
        }),
        kind @ ("string" | "binary" | "date") => {
            let encoding = description
                .flags
                .as_ref()
                .and_then(|flags| flags.encoding.as_deref());
            let mut format = match kind {
                "binary" if encoding == Some("base64") => Some("byte".to_string()),
                "binary" => Some("binary".to_string()),
                "date" => Some("date".to_string()),
                _ => None,
            };
            for rule in &description.rules {
                if let Some((_, mapped)) = FORMATS.iter().find(|(name, _)| *name == rule.name) {
                    format = Some((*mapped).to_string());
                }
            }

            SchemaNode::String(StringSchema {
                max_length: limit(description, "max"),
                min_length: limit(description, "min"),
                required: Some(attributes.required),
                default: attributes.default_if(Value::is_string),
                description: attributes.description.clone(),
                example: attributes.example_if(Value::is_string),
                enum_values: description.allow.clone(),
                format,
                pattern: pattern(description),
            })
        }
        "number" => SchemaNode::Number(NumberSchema {
            integer: description.rule("integer").is_some(),
            maximum: limit(description, "max"),
            minimum: limit(description, "min"),
            required: Some(attributes.required),
            default: attributes.default_if(Value::is_number),
            description: attributes.description.clone(),
            example: attributes.example_if(Value::is_number),
            enum_values: description.allow.clone(),
        }),
        "boolean" => SchemaNode::Boolean(BooleanSchema {
            required: Some(attributes.required),
            default: attributes.default_if(Value::is_boolean),
            description: attributes.description.clone(),
            example: attributes.example_if(Value::is_boolean),
            enum_values: description.allow.clone(),
        }),
        other => {
            tracing::trace!(schema_type = other, "Documenting unsupported schema type as {{}}");
            SchemaNode::Empty
        }
    }
}
