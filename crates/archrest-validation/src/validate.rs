//! The validation engine.

use crate::{Presence, Rule, Schema, SchemaType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use std::fmt;
use std::sync::OnceLock;

/// Engine options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationOptions {
    /// Stop at the first error instead of collecting all of them.
    pub abort_early: bool,
    /// Accept undeclared object keys unless a schema says otherwise.
    pub allow_unknown: bool,
    /// Convert strings to numbers and booleans where the schema asks for them.
    pub convert: bool,
    /// Presence of values whose schema does not declare one.
    pub presence: Option<Presence>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            abort_early: true,
            allow_unknown: false,
            convert: true,
            presence: None,
        }
    }
}

/// A segment of the path to a failing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Human readable message.
    pub message: String,
    /// Path to the failing value.
    pub path: Vec<PathSegment>,
    /// Error type, e.g. `string.min`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Error context: label, key, value and rule arguments.
    pub context: Value,
}

impl fmt::Display for ValidationErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn label(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push_str(&format!("[{index}]"));
            }
        }
    }
    if out.is_empty() {
        "value".to_string()
    } else {
        out
    }
}

struct Collector<'o> {
    options: &'o ValidationOptions,
    errors: Vec<ValidationErrorDetail>,
}

impl Collector<'_> {
    fn done(&self) -> bool {
        self.options.abort_early && !self.errors.is_empty()
    }

    fn report(&mut self, path: &[PathSegment], kind: &str, message: &str, extra: Value) {
        let label = label(path);
        let mut context = Map::new();
        context.insert("label".into(), Value::String(label.clone()));
        if let Some(PathSegment::Key(key)) = path.last() {
            context.insert("key".into(), Value::String(key.clone()));
        } else if let Some(PathSegment::Index(index)) = path.last() {
            context.insert("key".into(), json!(index));
        }
        if let Value::Object(extra) = extra {
            context.extend(extra);
        }
        self.errors.push(ValidationErrorDetail {
            message: format!("\"{label}\" {message}"),
            path: path.to_vec(),
            kind: kind.to_string(),
            context: Value::Object(context),
        });
    }
}

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn regex_match(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    cached(cell, pattern).is_some_and(|regex| regex.is_match(value))
}

fn is_email(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex_match(&RE, r"^[^\s@]+@[^\s@]+\.[^\s@]+$", value)
}

fn is_hostname(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    value.len() <= 255
        && regex_match(
            &RE,
            r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
            value,
        )
}

fn is_uri(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex_match(&RE, r"^[A-Za-z][A-Za-z0-9+.-]*:[^\s]*$", value)
}

fn is_data_uri(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex_match(&RE, r"^data:[\w/+.-]*(?:;[\w=.+-]+)*,[^\s]*$", value)
}

fn is_base64(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex_match(
        &RE,
        r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$",
        value,
    )
}

fn is_date(value: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    regex_match(
        &RE,
        r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
        value,
    )
}

fn limit_f64(limit: &Number) -> f64 {
    limit.as_f64().unwrap_or(0.0)
}

fn number_from_str(value: &str) -> Option<Number> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

impl Schema {
    /// Validates `value`, returning it with conversions and defaults applied.
    pub fn validate(
        &self,
        value: &Value,
        options: &ValidationOptions,
    ) -> Result<Value, Vec<ValidationErrorDetail>> {
        self.validate_at(Some(value), &[], options)
            .map(|value| value.unwrap_or(Value::Null))
    }

    /// Validates a possibly absent value below `path`.
    pub(crate) fn validate_at(
        &self,
        value: Option<&Value>,
        path: &[PathSegment],
        options: &ValidationOptions,
    ) -> Result<Option<Value>, Vec<ValidationErrorDetail>> {
        let mut collector = Collector {
            options,
            errors: Vec::new(),
        };
        let mut path = path.to_vec();
        let result = self.check(value, &mut path, &mut collector);
        if collector.errors.is_empty() {
            Ok(result)
        } else {
            Err(collector.errors)
        }
    }

    fn check(
        &self,
        value: Option<&Value>,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let presence = self
            .presence
            .or(out.options.presence)
            .unwrap_or(Presence::Optional);

        let Some(value) = value else {
            if presence == Presence::Required {
                out.report(path, "any.required", "is required", Value::Null);
            }
            return self.default.clone();
        };

        if presence == Presence::Forbidden {
            out.report(path, "any.unknown", "is not allowed", Value::Null);
            return None;
        }

        if self.allow.contains(value) {
            return Some(value.clone());
        }
        if self.only {
            let valids = Value::Array(self.allow.clone());
            let listed: Vec<String> = self.allow.iter().map(Value::to_string).collect();
            out.report(
                path,
                "any.only",
                &format!("must be one of [{}]", listed.join(", ")),
                json!({ "value": value, "valids": valids }),
            );
            return None;
        }

        match self.kind {
            SchemaType::Any => Some(value.clone()),
            SchemaType::String => self.check_string(value, path, out),
            SchemaType::Binary => self.check_binary(value, path, out),
            SchemaType::Date => self.check_date(value, path, out),
            SchemaType::Number => self.check_number(value, path, out),
            SchemaType::Boolean => self.check_boolean(value, path, out),
            SchemaType::Object => self.check_object(value, path, out),
            SchemaType::Array => self.check_array(value, path, out),
        }
    }

    fn check_length(
        &self,
        kind: &str,
        unit: &str,
        len: usize,
        path: &[PathSegment],
        out: &mut Collector<'_>,
    ) {
        for rule in &self.rules {
            if out.done() {
                return;
            }
            match rule {
                Rule::Min(limit) if (len as f64) < limit_f64(limit) => out.report(
                    path,
                    &format!("{kind}.min"),
                    &format!("must contain at least {limit} {unit}"),
                    json!({ "limit": limit }),
                ),
                Rule::Max(limit) if (len as f64) > limit_f64(limit) => out.report(
                    path,
                    &format!("{kind}.max"),
                    &format!("must contain less than or equal to {limit} {unit}"),
                    json!({ "limit": limit }),
                ),
                _ => {}
            }
        }
    }

    fn check_string(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let Some(text) = value.as_str() else {
            out.report(path, "string.base", "must be a string", json!({ "value": value }));
            return None;
        };
        if text.is_empty() {
            out.report(path, "string.empty", "is not allowed to be empty", json!({ "value": value }));
            return None;
        }

        self.check_length("string", "characters", text.chars().count(), path, out);
        for rule in &self.rules {
            if out.done() {
                break;
            }
            let failure = match rule {
                Rule::Pattern(regex) if !regex.is_match(text) => Some((
                    "string.pattern.base",
                    format!("with value \"{text}\" fails to match the required pattern: {regex}"),
                )),
                Rule::Email if !is_email(text) => {
                    Some(("string.email", "must be a valid email".to_string()))
                }
                Rule::Guid if uuid::Uuid::parse_str(text).is_err() => {
                    Some(("string.guid", "must be a valid GUID".to_string()))
                }
                Rule::Hostname if !is_hostname(text) => {
                    Some(("string.hostname", "must be a valid hostname".to_string()))
                }
                Rule::Uri if !is_uri(text) => Some(("string.uri", "must be a valid uri".to_string())),
                Rule::DataUri if !is_data_uri(text) => {
                    Some(("string.dataUri", "must be a valid dataUri string".to_string()))
                }
                Rule::Base64 if !is_base64(text) => {
                    Some(("string.base64", "must be a valid base64 string".to_string()))
                }
                _ => None,
            };
            if let Some((kind, message)) = failure {
                out.report(path, kind, &message, json!({ "value": value }));
            }
        }
        Some(value.clone())
    }

    fn check_binary(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let Some(text) = value.as_str() else {
            out.report(path, "binary.base", "must be a buffer or a string", json!({ "value": value }));
            return None;
        };
        if self.encoding.as_deref() == Some("base64") && !is_base64(text) {
            out.report(path, "binary.base", "must be a valid base64 string", json!({ "value": value }));
            return None;
        }
        self.check_length("binary", "bytes", text.len(), path, out);
        Some(value.clone())
    }

    fn check_date(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let valid = match value {
            Value::Number(_) => true,
            Value::String(text) => is_date(text),
            _ => false,
        };
        if valid {
            Some(value.clone())
        } else {
            out.report(path, "date.base", "must be a valid date", json!({ "value": value }));
            None
        }
    }

    fn check_number(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let number = match value {
            Value::Number(number) => Some(number.clone()),
            Value::String(text) if out.options.convert => number_from_str(text),
            _ => None,
        };
        let Some(number) = number else {
            out.report(path, "number.base", "must be a number", json!({ "value": value }));
            return None;
        };

        let as_f64 = number.as_f64().unwrap_or(0.0);
        for rule in &self.rules {
            if out.done() {
                break;
            }
            match rule {
                Rule::Integer if as_f64.fract() != 0.0 => out.report(
                    path,
                    "number.integer",
                    "must be an integer",
                    json!({ "value": value }),
                ),
                Rule::Min(limit) if as_f64 < limit_f64(limit) => out.report(
                    path,
                    "number.min",
                    &format!("must be greater than or equal to {limit}"),
                    json!({ "limit": limit, "value": value }),
                ),
                Rule::Max(limit) if as_f64 > limit_f64(limit) => out.report(
                    path,
                    "number.max",
                    &format!("must be less than or equal to {limit}"),
                    json!({ "limit": limit, "value": value }),
                ),
                _ => {}
            }
        }
        Some(Value::Number(number))
    }

    fn check_boolean(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let converted = match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) if out.options.convert => match text.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        };
        match converted {
            Some(flag) => Some(Value::Bool(flag)),
            None => {
                out.report(path, "boolean.base", "must be a boolean", json!({ "value": value }));
                None
            }
        }
    }

    fn check_object(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let Some(object) = value.as_object() else {
            out.report(path, "object.base", "must be of type object", json!({ "value": value }));
            return None;
        };

        let mut result = object.clone();
        if let Some(keys) = &self.keys {
            for (name, child) in keys {
                if out.done() {
                    return None;
                }
                path.push(PathSegment::Key(name.clone()));
                match child.check(object.get(name), path, out) {
                    Some(checked) => {
                        result.insert(name.clone(), checked);
                    }
                    None => {
                        result.remove(name);
                    }
                }
                path.pop();
            }

            let allow_unknown = self.unknown.unwrap_or(out.options.allow_unknown);
            if !allow_unknown {
                for name in object.keys().filter(|name| !keys.contains_key(*name)) {
                    if out.done() {
                        return None;
                    }
                    path.push(PathSegment::Key(name.clone()));
                    out.report(path, "object.unknown", "is not allowed", json!({ "value": object[name] }));
                    path.pop();
                }
            }
        }

        self.check_length("object", "keys", result.len(), path, out);
        Some(Value::Object(result))
    }

    fn check_array(
        &self,
        value: &Value,
        path: &mut Vec<PathSegment>,
        out: &mut Collector<'_>,
    ) -> Option<Value> {
        let Some(items) = value.as_array() else {
            out.report(path, "array.base", "must be an array", json!({ "value": value }));
            return None;
        };

        let mut result = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if out.done() {
                return None;
            }
            path.push(PathSegment::Index(index));
            result.push(self.check_item(item, path, out));
            path.pop();
        }

        self.check_length("array", "items", result.len(), path, out);
        if self.rules.iter().any(|rule| matches!(rule, Rule::Unique)) {
            for (index, item) in result.iter().enumerate() {
                if out.done() {
                    break;
                }
                if result[..index].contains(item) {
                    path.push(PathSegment::Index(index));
                    out.report(path, "array.unique", "contains a duplicate value", json!({ "value": item }));
                    path.pop();
                }
            }
        }
        Some(Value::Array(result))
    }

    fn check_item(&self, item: &Value, path: &mut Vec<PathSegment>, out: &mut Collector<'_>) -> Value {
        match self.items.as_slice() {
            [] => item.clone(),
            [only] => only.check(Some(item), path, out).unwrap_or(Value::Null),
            alternatives => {
                for schema in alternatives {
                    if let Ok(Some(checked)) = schema.validate_at(Some(item), path, out.options) {
                        return checked;
                    }
                }
                out.report(
                    path,
                    "array.includes",
                    "does not match any of the allowed types",
                    json!({ "value": item }),
                );
                item.clone()
            }
        }
    }
}
