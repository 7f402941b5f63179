//! Request validation stage.
//!
//! Hands params, headers, query and body to a [`ValidationStrategy`]. On
//! success the converted params, query and body replace the originals on the
//! context. Headers are checked but never rewritten. On failure the request
//! ends with `400` and the list of error details.

use crate::middleware::{Middleware, Next};
use archrest_core::{BoxFuture, Request, RequestContext, Response, ResponseExt};
use archrest_validation::{RequestData, ValidationSchema, ValidationStrategy};
use http::StatusCode;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Middleware validating a request against a route's schema.
#[derive(Clone)]
pub struct ValidationStage {
    schema: Arc<ValidationSchema>,
    strategy: Arc<dyn ValidationStrategy>,
}

impl ValidationStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(schema: Arc<ValidationSchema>, strategy: Arc<dyn ValidationStrategy>) -> Self {
        Self { schema, strategy }
    }
}

fn headers_to_value(request: &Request) -> Value {
    let mut headers = Map::new();
    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            headers.insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(headers)
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl Middleware for ValidationStage {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let data = RequestData {
                params: Value::Object(ctx.params().clone()),
                headers: headers_to_value(&request),
                query: Value::Object(ctx.query().clone()),
                body: ctx.body().cloned(),
            };

            match self.strategy.validate(&self.schema, data) {
                Ok(validated) => {
                    ctx.set_params(into_map(validated.params));
                    ctx.set_query(into_map(validated.query));
                    if let Some(body) = validated.body {
                        ctx.set_body(body);
                    }
                    next.run(ctx, request).await
                }
                Err(details) => {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        errors = details.len(),
                        "Request validation failed"
                    );
                    Response::json(StatusCode::BAD_REQUEST, &details)
                }
            }
        })
    }
}

impl fmt::Debug for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationStage")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MiddlewareChain;
    use crate::FnMiddleware;
    use archrest_validation::{Schema, SchemaValidator};
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use serde_json::json;

    fn stage(schema: ValidationSchema) -> ValidationStage {
        ValidationStage::new(Arc::new(schema), Arc::new(SchemaValidator::default()))
    }

    fn echo() -> impl Middleware {
        FnMiddleware::new("echo", |ctx, _request, _next| {
            Box::pin(async move {
                Response::json(
                    StatusCode::OK,
                    &json!({
                        "params": ctx.params(),
                        "query": ctx.query(),
                        "body": ctx.body(),
                    }),
                )
            })
        })
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/orders/7?limit=5")
            .header("x-api-key", "secret")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_converted_values_are_written_back() {
        let schema = ValidationSchema::new()
            .params(Schema::object().key("id", Schema::number().integer()))
            .query(Schema::object().key("limit", Schema::number().max(10)));
        let chain = MiddlewareChain::new(vec![Arc::new(stage(schema)), Arc::new(echo())]);

        let request = request();
        let mut ctx = RequestContext::from_request(&request);
        let mut params = Map::new();
        params.insert("id".into(), json!("7"));
        ctx.set_params(params);

        let response = chain.handle(&mut ctx, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = json_body(response).await;
        assert_eq!(value["params"]["id"], 7);
        assert_eq!(value["query"]["limit"], 5);
    }

    #[tokio::test]
    async fn test_failure_returns_detail_array() {
        let schema = ValidationSchema::new().body(
            Schema::object()
                .key("qty", Schema::number().min(1).required())
                .required(),
        );
        let chain = MiddlewareChain::new(vec![Arc::new(stage(schema)), Arc::new(echo())]);

        let mut ctx = RequestContext::new();
        ctx.set_body(json!({ "qty": 0 }));
        let response = chain.handle(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value = json_body(response).await;
        let details = value.as_array().unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0]["type"], "number.min");
        assert_eq!(details[0]["path"], json!(["body", "qty"]));
        assert!(details[0]["message"].as_str().unwrap().contains("qty"));
    }

    #[tokio::test]
    async fn test_headers_are_checked() {
        let schema = ValidationSchema::new().headers(
            Schema::object()
                .key("x-api-key", Schema::string().valid(["other"]).required())
                .unknown(true),
        );
        let chain = MiddlewareChain::new(vec![Arc::new(stage(schema)), Arc::new(echo())]);
        let response = chain.handle(&mut RequestContext::new(), request()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
