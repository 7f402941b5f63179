//! Schema builder.

use crate::{Description, DescribedRule, DescriptionFlags, RuleArgs, SchemaError};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// The value type a schema accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// Anything.
    Any,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// A string.
    String,
    /// A number.
    Number,
    /// A boolean.
    Boolean,
    /// Binary content carried as a string.
    Binary,
    /// A date, as an ISO-8601 string or a millisecond timestamp.
    Date,
}

impl SchemaType {
    /// The lower-case type name used in descriptions.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Binary => "binary",
            Self::Date => "date",
        }
    }
}

/// Whether a value must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    /// The value may be absent.
    Optional,
    /// The value must be present.
    Required,
    /// The value must be absent.
    Forbidden,
}

/// A constraint attached to a schema.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Lower bound: length for strings, arrays and binaries, key count for
    /// objects, value for numbers.
    Min(Number),
    /// Upper bound, same interpretation as [`Rule::Min`].
    Max(Number),
    /// Numbers must be integers.
    Integer,
    /// Strings must match the regex.
    Pattern(Regex),
    /// Strings must be e-mail addresses.
    Email,
    /// Strings must be GUIDs.
    Guid,
    /// Strings must be host names.
    Hostname,
    /// Strings must be URIs.
    Uri,
    /// Strings must be data URIs.
    DataUri,
    /// Strings must be base64.
    Base64,
    /// Array items must be distinct.
    Unique,
}

impl Rule {
    /// The rule name used in descriptions.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Integer => "integer",
            Self::Pattern(_) => "pattern",
            Self::Email => "email",
            Self::Guid => "guid",
            Self::Hostname => "hostname",
            Self::Uri => "uri",
            Self::DataUri => "dataUri",
            Self::Base64 => "base64",
            Self::Unique => "unique",
        }
    }

    fn describe(&self) -> DescribedRule {
        let args = match self {
            Self::Min(limit) | Self::Max(limit) => Some(RuleArgs {
                limit: Some(Value::Number(limit.clone())),
                regex: None,
            }),
            Self::Pattern(regex) => Some(RuleArgs {
                limit: None,
                regex: Some(regex.as_str().to_string()),
            }),
            _ => None,
        };
        DescribedRule {
            name: self.name().to_string(),
            args,
        }
    }
}

/// A declarative schema.
///
/// Built with the constructor for its type and refined with chained calls.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) kind: SchemaType,
    pub(crate) presence: Option<Presence>,
    pub(crate) default: Option<Value>,
    pub(crate) description: Option<String>,
    pub(crate) encoding: Option<String>,
    pub(crate) format: Option<String>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) allow: Vec<Value>,
    pub(crate) only: bool,
    pub(crate) examples: Vec<Value>,
    pub(crate) keys: Option<IndexMap<String, Schema>>,
    pub(crate) items: Vec<Schema>,
    pub(crate) unknown: Option<bool>,
}

impl Schema {
    fn of(kind: SchemaType) -> Self {
        Self {
            kind,
            presence: None,
            default: None,
            description: None,
            encoding: None,
            format: None,
            rules: Vec::new(),
            allow: Vec::new(),
            only: false,
            examples: Vec::new(),
            keys: None,
            items: Vec::new(),
            unknown: None,
        }
    }

    /// Accepts any value.
    #[must_use]
    pub fn any() -> Self {
        Self::of(SchemaType::Any)
    }

    /// An object; restrict its keys with [`key`](Self::key) or [`keys`](Self::keys).
    #[must_use]
    pub fn object() -> Self {
        Self::of(SchemaType::Object)
    }

    /// An array; restrict its items with [`items`](Self::items).
    #[must_use]
    pub fn array() -> Self {
        Self::of(SchemaType::Array)
    }

    /// A string.
    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    /// A number.
    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    /// A boolean.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaType::Boolean)
    }

    /// Binary content.
    #[must_use]
    pub fn binary() -> Self {
        Self::of(SchemaType::Binary)
    }

    /// A date.
    #[must_use]
    pub fn date() -> Self {
        Self::of(SchemaType::Date)
    }

    /// The schema type.
    #[must_use]
    pub const fn schema_type(&self) -> SchemaType {
        self.kind
    }

    /// The declared presence, if any.
    #[must_use]
    pub const fn presence(&self) -> Option<Presence> {
        self.presence
    }

    /// Declared object keys, in declaration order.
    #[must_use]
    pub const fn declared_keys(&self) -> Option<&IndexMap<String, Schema>> {
        self.keys.as_ref()
    }

    /// Marks the value as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.presence = Some(Presence::Required);
        self
    }

    /// Marks the value as optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.presence = Some(Presence::Optional);
        self
    }

    /// Marks the value as forbidden.
    #[must_use]
    pub fn forbidden(mut self) -> Self {
        self.presence = Some(Presence::Forbidden);
        self
    }

    /// Value used when the input is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Human readable description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an example value.
    #[must_use]
    pub fn example(mut self, example: impl Into<Value>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Restricts the value to the listed values.
    #[must_use]
    pub fn valid<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allow.extend(values.into_iter().map(Into::into));
        self.only = true;
        self
    }

    /// Accepts the listed values in addition to what the type accepts.
    #[must_use]
    pub fn allow<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allow.extend(values.into_iter().map(Into::into));
        self
    }

    /// Lower bound.
    #[must_use]
    pub fn min(self, limit: impl Into<Number>) -> Self {
        self.rule(Rule::Min(limit.into()))
    }

    /// Upper bound.
    #[must_use]
    pub fn max(self, limit: impl Into<Number>) -> Self {
        self.rule(Rule::Max(limit.into()))
    }

    /// Fractional lower bound. Non-finite limits are ignored.
    #[must_use]
    pub fn min_f64(self, limit: f64) -> Self {
        match Number::from_f64(limit) {
            Some(limit) => self.rule(Rule::Min(limit)),
            None => self,
        }
    }

    /// Fractional upper bound. Non-finite limits are ignored.
    #[must_use]
    pub fn max_f64(self, limit: f64) -> Self {
        match Number::from_f64(limit) {
            Some(limit) => self.rule(Rule::Max(limit)),
            None => self,
        }
    }

    /// Numbers must be integers.
    #[must_use]
    pub fn integer(self) -> Self {
        self.rule(Rule::Integer)
    }

    /// Strings must match `regex`.
    #[must_use]
    pub fn pattern(self, regex: Regex) -> Self {
        self.rule(Rule::Pattern(regex))
    }

    /// Strings must match `pattern`, compiled here.
    pub fn pattern_str(self, pattern: &str) -> Result<Self, SchemaError> {
        let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self.pattern(regex))
    }

    /// Strings must be e-mail addresses.
    #[must_use]
    pub fn email(self) -> Self {
        self.rule(Rule::Email)
    }

    /// Strings must be GUIDs.
    #[must_use]
    pub fn guid(self) -> Self {
        self.rule(Rule::Guid)
    }

    /// Strings must be host names.
    #[must_use]
    pub fn hostname(self) -> Self {
        self.rule(Rule::Hostname)
    }

    /// Strings must be URIs.
    #[must_use]
    pub fn uri(self) -> Self {
        self.rule(Rule::Uri)
    }

    /// Strings must be data URIs.
    #[must_use]
    pub fn data_uri(self) -> Self {
        self.rule(Rule::DataUri)
    }

    /// Strings must be base64.
    #[must_use]
    pub fn base64(self) -> Self {
        self.rule(Rule::Base64)
    }

    /// Array items must be distinct.
    #[must_use]
    pub fn unique(self) -> Self {
        self.rule(Rule::Unique)
    }

    /// Allows or rejects undeclared object keys, overriding the global option.
    #[must_use]
    pub fn unknown(mut self, allow: bool) -> Self {
        self.unknown = Some(allow);
        self
    }

    /// Encoding of binary content, e.g. `base64`.
    #[must_use]
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Documentation format hint.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Declares one object key.
    #[must_use]
    pub fn key(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.keys
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), schema);
        self
    }

    /// Declares several object keys.
    #[must_use]
    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        let map = self.keys.get_or_insert_with(IndexMap::new);
        for (name, schema) in keys {
            map.insert(name.into(), schema);
        }
        self
    }

    /// Declares an accepted array item schema. Several calls accept any of them.
    #[must_use]
    pub fn items(mut self, schema: Schema) -> Self {
        self.items.push(schema);
        self
    }

    fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Describes the schema in its introspection form.
    #[must_use]
    pub fn describe(&self) -> Description {
        let flags = DescriptionFlags {
            presence: self.presence,
            default: self.default.clone(),
            description: self.description.clone(),
            encoding: self.encoding.clone(),
            format: self.format.clone(),
            only: self.only.then_some(true),
            unknown: self.unknown,
        };

        Description {
            schema_type: self.kind.as_str().to_string(),
            flags: (!flags.is_empty()).then_some(flags),
            rules: self.rules.iter().map(Rule::describe).collect(),
            keys: self.keys.as_ref().map(|keys| {
                keys.iter()
                    .map(|(name, schema)| (name.clone(), schema.describe()))
                    .collect()
            }),
            items: self.items.iter().map(Schema::describe).collect(),
            allow: self.allow.clone(),
            examples: self.examples.clone(),
        }
    }
}
