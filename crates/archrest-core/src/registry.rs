//! Mapping of route handler errors to responses.

use crate::{HttpError, Response, ResponseExt};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Options of the built-in error rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpErrorsOptions {
    /// Render the display text of unexpected errors instead of a generic message.
    pub expose_internal_messages: bool,
}

type TypedHandler = Arc<dyn Fn(&anyhow::Error) -> Option<Response> + Send + Sync>;
type DefaultHandler = Arc<dyn Fn(&anyhow::Error) -> Response + Send + Sync>;

/// Turns errors returned by route handlers into responses.
///
/// Lookup order:
/// 1. handlers registered with [`on`](Self::on), in registration order,
///    matched by downcasting to their error type
/// 2. the handler set with [`default_handler`](Self::default_handler)
/// 3. [`HttpError`] rendered as `{ "error", "data" }` with its status
/// 4. a 500 `{ "error": "Internal Server Error" }`
///
/// ```
/// use archrest_core::{ErrorRegistry, HttpError, Response, ResponseExt};
/// use http::StatusCode;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("quota exceeded")]
/// struct QuotaExceeded;
///
/// let registry = ErrorRegistry::new()
///     .on(|_: &QuotaExceeded| Response::empty(StatusCode::TOO_MANY_REQUESTS));
///
/// let response = registry.handle(&anyhow::Error::new(QuotaExceeded));
/// assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
/// ```
#[derive(Clone, Default)]
pub struct ErrorRegistry {
    handlers: Vec<(&'static str, TypedHandler)>,
    default_handler: Option<DefaultHandler>,
    options: HttpErrorsOptions,
}

impl ErrorRegistry {
    /// Creates a registry with only the built-in rendering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the built-in rendering options.
    #[must_use]
    pub fn with_options(mut self, options: HttpErrorsOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a handler for errors of type `E`.
    #[must_use]
    pub fn on<E, F>(mut self, handler: F) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(&E) -> Response + Send + Sync + 'static,
    {
        let typed: TypedHandler =
            Arc::new(move |error: &anyhow::Error| error.downcast_ref::<E>().map(&handler));
        self.handlers.push((std::any::type_name::<E>(), typed));
        self
    }

    /// Sets the handler used when no typed handler matches.
    #[must_use]
    pub fn default_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&anyhow::Error) -> Response + Send + Sync + 'static,
    {
        self.default_handler = Some(Arc::new(handler));
        self
    }

    /// Renders `error` as a response.
    #[must_use]
    pub fn handle(&self, error: &anyhow::Error) -> Response {
        for (name, handler) in &self.handlers {
            if let Some(response) = handler(error) {
                tracing::debug!(error_type = name, "Error handled by registered handler");
                return response;
            }
        }

        if let Some(handler) = &self.default_handler {
            return handler(error);
        }

        if let Some(http_error) = error.downcast_ref::<HttpError>() {
            return http_error.to_response();
        }

        tracing::error!(error = %error, "Unhandled error in route handler");
        let message = if self.options.expose_internal_messages {
            error.to_string()
        } else {
            "Internal Server Error".to_string()
        };
        Response::json(StatusCode::INTERNAL_SERVER_ERROR, &json!({ "error": message }))
    }
}

impl fmt::Debug for ErrorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|(name, _)| *name).collect();
        f.debug_struct("ErrorRegistry")
            .field("handlers", &names)
            .field("default_handler", &self.default_handler.is_some())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    #[derive(Debug, thiserror::Error)]
    #[error("locked")]
    struct Locked;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_http_error_rendering() {
        let registry = ErrorRegistry::new();
        let error = anyhow::Error::new(HttpError::not_found("missing").with_data(json!(1)));
        let response = registry.handle(&error);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "missing", "data": 1}));
    }

    #[tokio::test]
    async fn test_unknown_error_is_500() {
        let registry = ErrorRegistry::new();
        let response = registry.handle(&anyhow::anyhow!("db exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "Internal Server Error"}));
    }

    #[tokio::test]
    async fn test_expose_internal_messages() {
        let registry = ErrorRegistry::new().with_options(HttpErrorsOptions {
            expose_internal_messages: true,
        });
        let response = registry.handle(&anyhow::anyhow!("db exploded"));
        assert_eq!(body_json(response).await, json!({"error": "db exploded"}));
    }

    #[test]
    fn test_typed_handler_wins_over_default() {
        let registry = ErrorRegistry::new()
            .default_handler(|_| Response::empty(StatusCode::BAD_GATEWAY))
            .on(|_: &Locked| Response::empty(StatusCode::LOCKED));

        assert_eq!(registry.handle(&anyhow::Error::new(Locked)).status(), StatusCode::LOCKED);
        assert_eq!(
            registry.handle(&anyhow::anyhow!("other")).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
