//! Route declarations and prefix resolution.
//!
//! The same helpers are used when mounting routes and when documenting them,
//! so the served path and the documented path never disagree.

use crate::HttpVerb;
use serde::{Deserialize, Serialize};

/// A route declared on a controller method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// The HTTP verb.
    pub method: HttpVerb,
    /// The declared path, always starting with `/`.
    pub path: String,
}

impl RouteInfo {
    /// Creates a route, normalizing the path with [`normalize_route_path`].
    #[must_use]
    pub fn new(method: HttpVerb, path: Option<&str>) -> Self {
        Self {
            method,
            path: normalize_route_path(path),
        }
    }
}

/// Normalizes a declared route path.
///
/// An absent or empty path becomes `/`; a missing leading slash is added.
///
/// ```
/// use archrest_core::normalize_route_path;
///
/// assert_eq!(normalize_route_path(None), "/");
/// assert_eq!(normalize_route_path(Some("users/:id")), "/users/:id");
/// ```
#[must_use]
pub fn normalize_route_path(path: Option<&str>) -> String {
    match path {
        None | Some("") => "/".to_string(),
        Some(p) if p.starts_with('/') => p.to_string(),
        Some(p) => format!("/{p}"),
    }
}

/// Resolves a controller prefix into its mountable form.
///
/// Trailing slashes are stripped and exactly one leading slash is enforced.
/// An absent or empty prefix resolves to `None`.
///
/// ```
/// use archrest_core::resolve_prefix;
///
/// assert_eq!(resolve_prefix(Some("users/")).as_deref(), Some("/users"));
/// assert_eq!(resolve_prefix(Some("/")), None);
/// assert_eq!(resolve_prefix(None), None);
/// ```
#[must_use]
pub fn resolve_prefix(prefix: Option<&str>) -> Option<String> {
    let trimmed = prefix?.trim_end_matches('/').trim_start_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

/// Joins a raw controller prefix and a method route path.
#[must_use]
pub fn join_route_path(prefix: Option<&str>, path: &str) -> String {
    let path = normalize_route_path(Some(path));
    match resolve_prefix(prefix) {
        Some(prefix) => format!("{prefix}{path}"),
        None => path,
    }
}
