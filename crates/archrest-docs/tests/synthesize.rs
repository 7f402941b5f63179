//! Document synthesis over realistic controller metadata.

use archrest_core::{
    handler_fn, join_route_path, ClassId, ControllerInfo, FileUploadSpec, HttpVerb, MetadataKey,
    MetadataStore, MethodInfo, OwnerId, Response, ResponseExt,
};
use archrest_docs::{
    synthesize, ApiKeyAuth, ApiKeyIn, HttpResponseSchema, SecurityDefinitions, SecurityOptions,
    SecuritySelection, SwaggerConfig, SwaggerOptions, TagDetails,
};
use archrest_validation::{Presence, Schema, ValidationSchema};
use http::StatusCode;
use serde_json::{json, Value};

struct TestController;
struct UsersController;
struct OtherController;

fn method(name: &str, verb: HttpVerb, prefix: Option<&str>, path: &str) -> MethodInfo {
    MethodInfo {
        name: name.to_string(),
        http_method: verb,
        http_path: join_route_path(prefix, path),
        guards: Vec::new(),
        handler: handler_fn(|_ctx, _request| async { Ok(Response::empty(StatusCode::OK)) }),
    }
}

fn controller<T: 'static>(prefix: Option<&str>, methods: Vec<MethodInfo>) -> ControllerInfo {
    ControllerInfo {
        name: ClassId::of::<T>().short_name().to_string(),
        prefix: prefix.map(str::to_string),
        class_id: ClassId::of::<T>(),
        methods,
        guards: Vec::new(),
    }
}

fn document(controllers: &[ControllerInfo], store: &MetadataStore, options: &SwaggerOptions) -> Value {
    serde_json::to_value(synthesize(controllers, store, options, Presence::Required)).unwrap()
}

#[test]
fn test_body_component_and_path_parameters() {
    let controllers = vec![controller::<TestController>(
        None,
        vec![method("create", HttpVerb::Post, None, "/test/:id/test/:name")],
    )];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(ClassId::of::<TestController>(), "create"),
        MetadataKey::ValidationSchema,
        ValidationSchema::new()
            .params(
                Schema::object()
                    .key("name", Schema::string().pattern_str("^[a-z]+$").unwrap()),
            )
            .body(
                Schema::object()
                    .key("name", Schema::string().required())
                    .key("age", Schema::number().optional()),
            ),
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());

    assert_eq!(
        doc["components"]["schemas"]["post-body"],
        json!({
            "type": "object",
            "required": true,
            "properties": {
                "name": { "type": "string", "required": true },
                "age": { "type": "number", "required": false },
            },
        })
    );

    let operation = &doc["paths"]["/test/{id}/test/{name}"]["post"];
    assert_eq!(operation["operationId"], "post");
    assert_eq!(operation["tags"], json!(["base"]));
    assert_eq!(
        operation["parameters"],
        json!([
            { "name": "id", "in": "path", "type": "string", "required": true },
            {
                "name": "name",
                "in": "path",
                "type": "string",
                "required": true,
                "pattern": "^[a-z]+$",
            },
        ])
    );
    assert_eq!(
        operation["requestBody"],
        json!({
            "required": true,
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/post-body" } },
            },
        })
    );
    assert_eq!(operation["responses"], json!({ "200": { "description": "" } }));
}

#[test]
fn test_multipart_body_for_uploads() {
    let controllers = vec![controller::<TestController>(
        Some("files"),
        vec![method("upload", HttpVerb::Post, Some("files"), "/")],
    )];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(ClassId::of::<TestController>(), "upload"),
        MetadataKey::FileUpload,
        vec![
            FileUploadSpec::new("file1"),
            FileUploadSpec::new("file2").with_max_count(3),
        ],
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());
    let body = &doc["paths"]["/files"]["post"]["requestBody"];
    let schema = &body["content"]["multipart/form-data"]["schema"];

    assert_eq!(
        schema,
        &json!({
            "type": "object",
            "properties": {
                "file1": { "type": "string", "format": "binary" },
                "file2": {
                    "type": "array",
                    "maxItems": 3,
                    "items": { "type": "string", "format": "binary" },
                },
            },
        })
    );
    assert!(schema.get("required").is_none());
    assert!(body.get("required").is_none());
    assert!(doc["components"]["schemas"].as_object().unwrap().is_empty());
}

#[test]
fn test_upload_merges_body_fields_and_drops_required() {
    let controllers = vec![controller::<TestController>(
        None,
        vec![method("upload", HttpVerb::Put, None, "/avatar")],
    )];
    let owner = OwnerId::method(ClassId::of::<TestController>(), "upload");
    let mut store = MetadataStore::new();
    store.set(owner.clone(), MetadataKey::FileUpload, vec![FileUploadSpec::new("avatar")]);
    store.set(
        owner,
        MetadataKey::ValidationSchema,
        ValidationSchema::new().body(Schema::object().key("caption", Schema::string()).required()),
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());
    let schema = &doc["paths"]["/avatar"]["put"]["requestBody"]["content"]["multipart/form-data"]["schema"];
    assert_eq!(schema["properties"]["caption"]["type"], "string");
    assert_eq!(schema["properties"]["avatar"]["format"], "binary");
    assert!(schema.get("required").is_none());
}

#[test]
fn test_enable_cascade() {
    let class = ClassId::of::<UsersController>();
    let controllers = vec![controller::<UsersController>(
        Some("/users/"),
        vec![
            method("list", HttpVerb::Get, Some("/users/"), "/"),
            method("remove", HttpVerb::Delete, Some("/users/"), "/:id"),
        ],
    )];

    let mut store = MetadataStore::new();
    store.set(OwnerId::method(class, "remove"), MetadataKey::Swagger, SwaggerConfig::new().enable(false));
    let doc = document(&controllers, &store, &SwaggerOptions::default());
    assert!(doc["paths"]["/users"]["get"].is_object());
    assert!(doc["paths"].get("/users/{id}").is_none());
    assert_eq!(doc["paths"]["/users"]["get"]["operationId"], "get-users");

    let mut store = MetadataStore::new();
    store.set(OwnerId::class(class), MetadataKey::Swagger, SwaggerConfig::new().enable(false));
    store.set(OwnerId::method(class, "remove"), MetadataKey::Swagger, SwaggerConfig::new().enable(true));
    let doc = document(&controllers, &store, &SwaggerOptions::default());
    assert!(doc["paths"].get("/users").is_none());
    assert!(doc["paths"]["/users/{id}"]["delete"].is_object());

    let options = SwaggerOptions {
        enable_all_routes: Some(false),
        ..SwaggerOptions::default()
    };
    let doc = document(&controllers, &MetadataStore::new(), &options);
    assert!(doc["paths"].as_object().unwrap().is_empty());
}

#[test]
fn test_responses_and_summary() {
    let class = ClassId::of::<UsersController>();
    let controllers = vec![controller::<UsersController>(
        Some("users"),
        vec![method("list", HttpVerb::Get, Some("users"), "/")],
    )];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::class(class),
        MetadataKey::Swagger,
        SwaggerConfig::new()
            .summary("User accounts")
            .tag(TagDetails {
                description: Some("Everything about users".to_string()),
                external_docs: None,
            }),
    );
    store.set(
        OwnerId::method(class, "list"),
        MetadataKey::ResponseSchemas,
        vec![
            HttpResponseSchema::new(200)
                .description("All users")
                .schema(json!({ "type": "object", "properties": { "id": { "type": "number" } } }))
                .array(),
            HttpResponseSchema::new(404),
        ],
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());
    let operation = &doc["paths"]["/users"]["get"];
    assert_eq!(operation["summary"], "User accounts");
    assert_eq!(
        operation["responses"],
        json!({
            "200": {
                "description": "All users",
                "content": {
                    "application/json": {
                        "schema": {
                            "type": "array",
                            "items": { "$ref": "#/components/schemas/get-users-response" },
                        },
                    },
                },
            },
            "404": { "description": "" },
        })
    );
    assert_eq!(
        doc["components"]["schemas"]["get-users-response"]["properties"]["id"]["type"],
        "number"
    );
    assert_eq!(
        doc["tags"],
        json!([{ "name": "users", "description": "Everything about users" }])
    );
}

#[test]
fn test_security_selection() {
    let class = ClassId::of::<UsersController>();
    let controllers = vec![controller::<UsersController>(
        Some("users"),
        vec![
            method("list", HttpVerb::Get, Some("users"), "/"),
            method("create", HttpVerb::Post, Some("users"), "/"),
        ],
    )];
    let options = SwaggerOptions {
        security: Some(SecurityOptions {
            definitions: SecurityDefinitions {
                basic_auth: false,
                bearer_auth: true,
                api_keys_auth: vec![ApiKeyAuth {
                    key: "x-api-key".to_string(),
                    location: ApiKeyIn::Header,
                }],
            },
            enable_all_routes: true,
        }),
        ..SwaggerOptions::default()
    };
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(class, "create"),
        MetadataKey::Swagger,
        SwaggerConfig::new().security(SecuritySelection {
            basic_auth: true,
            bearer_auth: false,
            api_keys_auth: vec!["x-api-key".to_string(), "unknown".to_string()],
        }),
    );

    let doc = document(&controllers, &store, &options);
    assert_eq!(
        doc["components"]["securitySchemes"],
        json!({
            "bearerAuth": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" },
            "x-api-key": { "type": "apiKey", "name": "x-api-key", "in": "header" },
        })
    );
    assert_eq!(
        doc["paths"]["/users"]["get"]["security"],
        json!([{ "bearerAuth": [] }, { "x-api-key": [] }])
    );
    assert_eq!(
        doc["paths"]["/users"]["post"]["security"],
        json!([{ "x-api-key": [] }])
    );
}

#[test]
fn test_untyped_path_parameter_is_required_string() {
    let controllers = vec![controller::<UsersController>(
        Some("users"),
        vec![method("find", HttpVerb::Get, Some("users"), "/:id/:any")],
    )];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(ClassId::of::<UsersController>(), "find"),
        MetadataKey::ValidationSchema,
        ValidationSchema::new().params(
            Schema::object()
                .key("id", Schema::number())
                .key("any", Schema::any()),
        ),
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());
    assert_eq!(
        doc["paths"]["/users/{id}/{any}"]["get"]["parameters"],
        json!([
            { "name": "id", "in": "path", "type": "number", "required": true },
            { "name": "any", "in": "path", "type": "string", "required": true },
        ])
    );
}

#[test]
fn test_query_and_header_parameters() {
    let controllers = vec![controller::<UsersController>(
        None,
        vec![method("search", HttpVerb::Get, None, "/search")],
    )];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(ClassId::of::<UsersController>(), "search"),
        MetadataKey::ValidationSchema,
        ValidationSchema::new()
            .headers(Schema::object().key("x-tenant", Schema::string().optional()))
            .query(Schema::object().key("limit", Schema::number().integer().max(100))),
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());
    assert_eq!(
        doc["paths"]["/search"]["get"]["parameters"],
        json!([
            { "name": "x-tenant", "in": "header", "type": "string", "required": false },
            { "name": "limit", "in": "query", "type": "integer", "maximum": 100, "required": true },
        ])
    );
}

#[test]
fn test_scalar_body_is_text_plain() {
    let controllers = vec![controller::<TestController>(
        None,
        vec![method("rename", HttpVerb::Patch, None, "/name")],
    )];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(ClassId::of::<TestController>(), "rename"),
        MetadataKey::ValidationSchema,
        ValidationSchema::new().body(Schema::string().optional()),
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());
    let body = &doc["paths"]["/name"]["patch"]["requestBody"];
    assert_eq!(body["required"], false);
    assert!(body["content"]["text/plain"].is_object());
}

#[test]
fn test_prefixless_controllers_share_operation_ids() {
    let controllers = vec![
        controller::<TestController>(None, vec![method("create", HttpVerb::Post, None, "/a")]),
        controller::<OtherController>(None, vec![method("create", HttpVerb::Post, None, "/b")]),
    ];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(ClassId::of::<TestController>(), "create"),
        MetadataKey::ValidationSchema,
        ValidationSchema::new().body(Schema::object().key("a", Schema::string())),
    );
    store.set(
        OwnerId::method(ClassId::of::<OtherController>(), "create"),
        MetadataKey::ValidationSchema,
        ValidationSchema::new().body(Schema::object().key("b", Schema::string())),
    );

    let doc = document(&controllers, &store, &SwaggerOptions::default());
    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert_eq!(schemas.len(), 1);
    assert!(schemas["post-body"]["properties"].get("b").is_some());
    assert_eq!(doc["tags"], json!([{ "name": "base" }]));
}

#[test]
fn test_synthesis_is_deterministic() {
    let controllers = vec![
        controller::<UsersController>(
            Some("users"),
            vec![
                method("list", HttpVerb::Get, Some("users"), "/"),
                method("find", HttpVerb::Get, Some("users"), "/:id"),
                method("update", HttpVerb::Put, Some("users"), "/:id"),
            ],
        ),
        controller::<TestController>(None, vec![method("root", HttpVerb::Get, None, "/")]),
    ];
    let mut store = MetadataStore::new();
    store.set(
        OwnerId::method(ClassId::of::<UsersController>(), "update"),
        MetadataKey::ValidationSchema,
        ValidationSchema::new().body(
            Schema::object()
                .key("zeta", Schema::string())
                .key("alpha", Schema::number())
                .key("mid", Schema::boolean()),
        ),
    );
    let options = SwaggerOptions::default();

    let first = synthesize(&controllers, &store, &options, Presence::Required)
        .to_json()
        .unwrap();
    let second = synthesize(&controllers, &store, &options, Presence::Required)
        .to_json()
        .unwrap();
    assert_eq!(first, second);
    assert!(first.find("\"zeta\"").unwrap() < first.find("\"alpha\"").unwrap());
    assert!(first.contains("\"/\":{\"get\""));
}
