//! Path template parsing.
//!
//! Route paths use the `:name` convention for parameters. OpenAPI wants
//! `{name}`. The parser rewrites one into the other and records parameter
//! names in the order they appear.

use std::collections::HashMap;

/// A parsed route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// The path with every `:name` segment rewritten to `{name}`.
    ///
    /// Empty for the root path; callers treat `""` as `/`.
    pub full_path: String,
    /// Parameter names, left to right.
    pub path_params: Vec<String>,
}

impl ParsedPath {
    /// The documented path, with the root spelled `/`.
    #[must_use]
    pub fn documented_path(&self) -> &str {
        if self.full_path.is_empty() {
            "/"
        } else {
            &self.full_path
        }
    }
}

/// Parses a `:name` style path template.
///
/// Empty segments, as produced by repeated slashes, are dropped.
///
/// ```
/// use archrest_docs::parse_path_template;
///
/// let parsed = parse_path_template("/test/:id/test/:name");
/// assert_eq!(parsed.full_path, "/test/{id}/test/{name}");
/// assert_eq!(parsed.path_params, vec!["id", "name"]);
/// ```
#[must_use]
pub fn parse_path_template(path: &str) -> ParsedPath {
    let mut full_path = String::with_capacity(path.len() + 2);
    let mut path_params = Vec::new();

    for segment in path.split('/').filter(|segment| !segment.is_empty()) {
        full_path.push('/');
        match segment.strip_prefix(':') {
            Some(name) => {
                full_path.push('{');
                full_path.push_str(name);
                full_path.push('}');
                path_params.push(name.to_string());
            }
            None => full_path.push_str(segment),
        }
    }

    ParsedPath {
        full_path,
        path_params,
    }
}

/// Memoizes [`parse_path_template`] for one document build.
///
/// Several verbs usually share a path; each raw path is parsed once.
#[derive(Debug, Default)]
pub struct PathTemplateCache {
    parsed: HashMap<String, ParsedPath>,
}

impl PathTemplateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parsed form of `path`, parsing it on first use.
    pub fn get(&mut self, path: &str) -> &ParsedPath {
        self.parsed
            .entry(path.to_string())
            .or_insert_with(|| parse_path_template(path))
    }

    /// Number of distinct paths parsed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parsed.len()
    }

    /// Returns `true` if nothing was parsed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }
}
