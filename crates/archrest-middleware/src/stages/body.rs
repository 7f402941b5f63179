//! Request body parsers.
//!
//! Application-wide middleware that decodes the raw body into the context's
//! parsed body, so validation and handlers can work on JSON values. A parser
//! only acts on requests whose `Content-Type` it understands.

use crate::middleware::{Middleware, Next};
use archrest_core::{BoxFuture, Request, RequestContext, Response, ResponseExt};
use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    UrlEncoded,
}

/// Middleware decoding request bodies.
///
/// ```
/// use archrest_middleware::BodyParser;
///
/// let json = BodyParser::json();
/// let form = BodyParser::urlencoded();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BodyParser {
    format: BodyFormat,
}

impl BodyParser {
    /// Parses `application/json` and `+json` bodies.
    #[must_use]
    pub const fn json() -> Self {
        Self {
            format: BodyFormat::Json,
        }
    }

    /// Parses `application/x-www-form-urlencoded` bodies.
    #[must_use]
    pub const fn urlencoded() -> Self {
        Self {
            format: BodyFormat::UrlEncoded,
        }
    }

    fn accepts(self, request: &Request) -> bool {
        let Some(content_type) = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<mime::Mime>().ok())
        else {
            return false;
        };

        match self.format {
            BodyFormat::Json => {
                content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON)
            }
            BodyFormat::UrlEncoded => {
                content_type.type_() == mime::APPLICATION
                    && content_type.subtype() == mime::WWW_FORM_URLENCODED
            }
        }
    }

    fn parse(self, bytes: &[u8]) -> Result<Value, String> {
        match self.format {
            BodyFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            BodyFormat::UrlEncoded => {
                let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
                Ok(Value::Object(archrest_core::parse_query(Some(text))))
            }
        }
    }
}

impl Middleware for BodyParser {
    fn name(&self) -> &'static str {
        "body-parser"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if !self.accepts(&request) {
                return next.run(ctx, request).await;
            }

            let (parts, body) = request.into_parts();
            let bytes = match http_body_util::BodyExt::collect(body).await {
                Ok(collected) => collected.to_bytes(),
                Err(never) => match never {},
            };

            if !bytes.is_empty() {
                match self.parse(&bytes) {
                    Ok(value) => ctx.set_body(value),
                    Err(message) => {
                        tracing::debug!(error = %message, "Malformed request body");
                        return Response::json(
                            StatusCode::BAD_REQUEST,
                            &json!({ "message": message }),
                        );
                    }
                }
            }

            let request = Request::from_parts(parts, http_body_util::Full::new(bytes));
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MiddlewareChain;
    use crate::FnMiddleware;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use std::sync::Arc;

    fn request(content_type: &str, body: &'static str) -> Request {
        http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, content_type)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    fn chain(parser: BodyParser) -> MiddlewareChain {
        let echo = FnMiddleware::new("echo", |ctx, _request, _next| {
            Box::pin(async move { Response::json(StatusCode::OK, &json!({ "body": ctx.body() })) })
        });
        MiddlewareChain::new(vec![Arc::new(parser), Arc::new(echo)])
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_body() {
        let response = chain(BodyParser::json())
            .handle(
                &mut RequestContext::new(),
                request("application/json; charset=utf-8", r#"{"name":"a"}"#),
            )
            .await;
        assert_eq!(json_body(response).await, json!({ "body": { "name": "a" } }));
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let response = chain(BodyParser::json())
            .handle(&mut RequestContext::new(), request("application/json", "{"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_other_content_type_is_skipped() {
        let response = chain(BodyParser::json())
            .handle(&mut RequestContext::new(), request("text/plain", "{"))
            .await;
        assert_eq!(json_body(response).await, json!({ "body": null }));
    }

    #[tokio::test]
    async fn test_urlencoded_body() {
        let response = chain(BodyParser::urlencoded())
            .handle(
                &mut RequestContext::new(),
                request("application/x-www-form-urlencoded", "tag=a&tag=b&name=x"),
            )
            .await;
        assert_eq!(
            json_body(response).await,
            json!({ "body": { "tag": ["a", "b"], "name": "x" } })
        );
    }
}
