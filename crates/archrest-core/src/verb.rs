//! HTTP verbs a controller method can be declared with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An HTTP verb accepted by route declarations.
///
/// [`HttpVerb::All`] matches every request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `OPTIONS`
    Options,
    /// Wildcard, matches any method.
    All,
}

/// Error returned when parsing an unknown verb name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP verb: {0}")]
pub struct UnknownVerb(pub String);

impl HttpVerb {
    /// Returns the upper-case verb name (`"GET"`, `"ALL"`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::All => "ALL",
        }
    }

    /// Returns the lower-case verb name, as used for OpenAPI path items.
    #[must_use]
    pub const fn as_lowercase(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Options => "options",
            Self::All => "all",
        }
    }

    /// Maps a concrete `http::Method` to a verb.
    ///
    /// Returns `None` for methods with no dedicated verb (`TRACE`, `CONNECT`,
    /// extension methods).
    #[must_use]
    pub fn from_method(method: &http::Method) -> Option<Self> {
        match *method {
            http::Method::GET => Some(Self::Get),
            http::Method::POST => Some(Self::Post),
            http::Method::PUT => Some(Self::Put),
            http::Method::DELETE => Some(Self::Delete),
            http::Method::HEAD => Some(Self::Head),
            http::Method::PATCH => Some(Self::Patch),
            http::Method::OPTIONS => Some(Self::Options),
            _ => None,
        }
    }

    /// Returns `true` if a request with `method` is served by this verb.
    #[must_use]
    pub fn matches(self, method: &http::Method) -> bool {
        self == Self::All || Self::from_method(method) == Some(self)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "PATCH" => Ok(Self::Patch),
            "OPTIONS" => Ok(Self::Options),
            "ALL" => Ok(Self::All),
            _ => Err(UnknownVerb(s.to_string())),
        }
    }
}
