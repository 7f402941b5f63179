//! The introspection form of a schema.
//!
//! Documentation generators consume these nodes rather than the builder, so a
//! description loaded from elsewhere (for instance deserialized from JSON) is
//! documented the same way.

use crate::Presence;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A described schema node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    /// Type name: `any`, `object`, `array`, `string`, `number`, `boolean`,
    /// `binary`, `date`, or anything else a foreign schema library reports.
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Flags set on the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<DescriptionFlags>,
    /// Rules in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<DescribedRule>,
    /// Object keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<IndexMap<String, Description>>,
    /// Array item schemas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Description>,
    /// Explicitly allowed values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<Value>,
    /// Example values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

impl Description {
    /// Returns the rule named `name`, if declared.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&DescribedRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// The declared presence, if any.
    #[must_use]
    pub fn presence(&self) -> Option<Presence> {
        self.flags.as_ref().and_then(|flags| flags.presence)
    }
}

/// Flags of a described node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionFlags {
    /// Declared presence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<Presence>,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Binary encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Format hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Set when only `allow` values are accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<bool>,
    /// Undeclared object key policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown: Option<bool>,
}

impl DescriptionFlags {
    /// Returns `true` if no flag is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A described rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribedRule {
    /// Rule name, e.g. `min`, `pattern`, `email`.
    pub name: String,
    /// Rule arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<RuleArgs>,
}

/// Arguments of a described rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleArgs {
    /// Numeric limit of `min` / `max`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,
    /// Regex source of `pattern`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl RuleArgs {
    /// The limit, or else the regex as a string value.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        self.limit
            .clone()
            .or_else(|| self.regex.clone().map(Value::String))
    }
}
