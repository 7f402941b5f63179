//! HTTP errors raised by route handlers.

use crate::{Response, ResponseExt};
use http::StatusCode;
use serde_json::{json, Value};

/// An error carrying the HTTP status it should be reported with.
///
/// Route handlers return `anyhow::Error`; an `HttpError` converts into it
/// with `?` and is recognized by the [`ErrorRegistry`](crate::ErrorRegistry).
///
/// ```
/// use archrest_core::HttpError;
/// use http::StatusCode;
///
/// let err = HttpError::not_found("user 42 not found");
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
    data: Option<Value>,
}

impl HttpError {
    /// Creates an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 403 Forbidden.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 404 Not Found.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 409 Conflict.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// 422 Unprocessable Entity.
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Attaches structured data to the error body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attached data, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The `{ "error": message, "data": data }` body.
    #[must_use]
    pub fn to_body(&self) -> Value {
        match &self.data {
            Some(data) => json!({ "error": self.message, "data": data }),
            None => json!({ "error": self.message }),
        }
    }

    /// Renders the error as a JSON response.
    #[must_use]
    pub fn to_response(&self) -> Response {
        Response::json(self.status, &self.to_body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_with_data() {
        let err = HttpError::conflict("duplicate").with_data(json!({"field": "email"}));
        assert_eq!(
            err.to_body(),
            json!({"error": "duplicate", "data": {"field": "email"}})
        );
        assert_eq!(err.to_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_display_is_message() {
        assert_eq!(HttpError::forbidden("nope").to_string(), "nope");
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(HttpError::bad_request("bad"))?
        }
        let err = fails().unwrap_err();
        assert_eq!(
            err.downcast_ref::<HttpError>().map(HttpError::status),
            Some(StatusCode::BAD_REQUEST)
        );
    }
}
