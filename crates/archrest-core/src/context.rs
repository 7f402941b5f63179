//! Request context types.
//!
//! The [`RequestContext`] carries per-request state through a route chain:
//! matched path parameters, the parsed query string, the request body once a
//! body parser or the upload stage has produced it, and uploaded files.

use crate::{Request, UploadedFile};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps request ids sortable in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request state shared by every stage of a route chain.
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    started_at: Instant,
    method_name: Option<String>,
    params: Map<String, Value>,
    query: Map<String, Value>,
    body: Option<Value>,
    files: Vec<UploadedFile>,
    extensions: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Creates an empty context with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            started_at: Instant::now(),
            method_name: None,
            params: Map::new(),
            query: Map::new(),
            body: None,
            files: Vec::new(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context for `request`, parsing its query string.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        let mut ctx = Self::new();
        ctx.query = parse_query(request.uri().query());
        ctx
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Name of the controller method serving this request, once routed.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }

    /// Records the controller method serving this request.
    pub fn set_method_name(&mut self, name: impl Into<String>) {
        self.method_name = Some(name.into());
    }

    /// Matched path parameters.
    #[must_use]
    pub const fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Replaces the path parameters.
    pub fn set_params(&mut self, params: Map<String, Value>) {
        self.params = params;
    }

    /// Returns a path parameter as a string, if it is one.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Parsed query string.
    #[must_use]
    pub const fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    /// Replaces the query values.
    pub fn set_query(&mut self, query: Map<String, Value>) {
        self.query = query;
    }

    /// Parsed request body, if a body parser or the upload stage produced one.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Mutable access to the parsed body.
    pub fn body_mut(&mut self) -> Option<&mut Value> {
        self.body.as_mut()
    }

    /// Replaces the parsed body.
    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Uploaded files, in the order they were received.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Records an uploaded file.
    pub fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    /// Stores a typed extension value, replacing any value of the same type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Returns the extension value of type `T`.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns `true` if an extension of type `T` is present.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method_name", &self.method_name)
            .field("params", &self.params)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("files", &self.files.len())
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}

/// Parses a query string into a JSON object.
///
/// Repeated keys collect into an array. A malformed query string yields an
/// empty object.
///
/// ```
/// use archrest_core::parse_query;
///
/// let query = parse_query(Some("tag=a&tag=b&page=2"));
/// assert_eq!(query["tag"], serde_json::json!(["a", "b"]));
/// assert_eq!(query["page"], "2");
/// ```
#[must_use]
pub fn parse_query(query: Option<&str>) -> Map<String, Value> {
    let mut map = Map::new();
    let Some(query) = query else {
        return map;
    };

    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
        Ok(pairs) => pairs,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed query string");
            return map;
        }
    };

    for (key, value) in pairs {
        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                map.insert(key, Value::String(value));
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use serde_json::json;

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_from_request_parses_query() {
        let request = http::Request::builder()
            .uri("/users?limit=10&sort=name")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let ctx = RequestContext::from_request(&request);
        assert_eq!(ctx.query()["limit"], "10");
        assert_eq!(ctx.query()["sort"], "name");
        assert!(ctx.body().is_none());
    }

    #[test]
    fn test_parse_query_repeated_keys() {
        let query = parse_query(Some("a=1&a=2&a=3"));
        assert_eq!(query["a"], json!(["1", "2", "3"]));
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_params_and_body() {
        let mut ctx = RequestContext::new();
        let mut params = Map::new();
        params.insert("id".into(), json!("42"));
        ctx.set_params(params);
        ctx.set_body(json!({"name": "x"}));
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.body(), Some(&json!({"name": "x"})));
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, PartialEq)]
        struct Tenant(&'static str);

        let mut ctx = RequestContext::new();
        assert!(!ctx.has_extension::<Tenant>());
        ctx.set_extension(Tenant("acme"));
        assert_eq!(ctx.get_extension::<Tenant>(), Some(&Tenant("acme")));

        let cloned = ctx.clone();
        assert!(cloned.has_extension::<Tenant>());
    }
}
