//! The prelude is enough to assemble and drive an application.

use archrest::prelude::*;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use serde_json::json;
use std::sync::Arc;

struct NotesController;

impl NotesController {
    async fn create(self: Arc<Self>, ctx: RequestContext, _req: Request) -> HandlerResult {
        let body = ctx.body().cloned().unwrap_or_default();
        Ok(Response::json(StatusCode::CREATED, &body))
    }
}

#[tokio::test]
async fn test_prelude_application() {
    let app = RestServer::builder()
        .sequence(
            Sequence::new()
                .middleware(BodyParser::json())
                .register_routes()
                .start_listening(),
        )
        .validation_options(ValidationOptions::default())
        .controller(
            ControllerBuilder::new::<NotesController>()
                .prefix("notes")
                .route(
                    RouteBuilder::post("/", "create", bind(Arc::new(NotesController), NotesController::create))
                        .validate(ValidationSchema::new().body(
                            Schema::object()
                                .key("text", Schema::string())
                                .key("pinned", Schema::boolean().default_value(false)),
                        )),
                ),
        )
        .build()
        .init()
        .expect("application should assemble");

    let request = http::Request::post("/notes")
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(r#"{"text":"buy milk"}"#)))
        .unwrap();
    let response = app.handle(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value, json!({ "text": "buy milk", "pinned": false }));
}
