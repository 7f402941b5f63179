//! OpenAPI synthesis from controller metadata.
//!
//! [`synthesize`] documents every enabled route of every controller. Path
//! parameters come from the route template, header, query and path parameter
//! schemas and request bodies from the method's validation schema, file
//! fields from its upload declaration, and everything else from swagger
//! annotations in the metadata store.

use crate::annotations::{
    HttpResponseSchema, SecurityDefinitions, SecuritySelection, SwaggerConfig, SwaggerOptions,
    Tag, TagDetails,
};
use crate::openapi::{
    ComponentSchema, Components, MediaType, OpenApiDocument, Operation, Parameter, ParameterIn,
    RequestBody, ResponseObject, SchemaOrRef, SecurityScheme,
};
use crate::path::PathTemplateCache;
use crate::schema::{
    schema_to_json_schema, ArraySchema, ObjectSchema, SchemaNode, StringSchema,
};
use archrest_core::{ControllerInfo, FileUploadSpec, MetadataKey, MetadataStore, MethodInfo};
use archrest_validation::{Presence, Schema, ValidationSchema};
use indexmap::IndexMap;
use serde_json::Number;

const BASIC_AUTH: &str = "basicAuth";
const BEARER_AUTH: &str = "bearerAuth";

/// Builds the OpenAPI document for `controllers`.
///
/// `presence` is the ambient presence mode used when a schema node does not
/// declare its own. The result depends only on its inputs; two calls over the
/// same metadata serialize to the same bytes.
#[must_use]
pub fn synthesize(
    controllers: &[ControllerInfo],
    store: &MetadataStore,
    options: &SwaggerOptions,
    presence: Presence,
) -> OpenApiDocument {
    let security_schemes = security_schemes(options.security.as_ref().map(|s| &s.definitions));
    let mut builder = Builder {
        store,
        options,
        presence,
        paths: PathTemplateCache::new(),
        document: OpenApiDocument {
            openapi: "3.0.0",
            servers: options.servers.clone(),
            info: options.info.clone(),
            tags: Vec::new(),
            components: Components {
                schemas: IndexMap::new(),
                security_schemes,
            },
            paths: IndexMap::new(),
        },
    };

    for controller in controllers {
        builder.controller(controller);
    }

    tracing::debug!(
        paths = builder.document.paths.len(),
        schemas = builder.document.components.schemas.len(),
        "OpenAPI document synthesized"
    );
    builder.document
}

fn security_schemes(definitions: Option<&SecurityDefinitions>) -> IndexMap<String, SecurityScheme> {
    let mut schemes = IndexMap::new();
    let Some(definitions) = definitions else {
        return schemes;
    };

    if definitions.basic_auth {
        schemes.insert(
            BASIC_AUTH.to_string(),
            SecurityScheme::Http {
                scheme: "basic".to_string(),
                bearer_format: None,
            },
        );
    }
    if definitions.bearer_auth {
        schemes.insert(
            BEARER_AUTH.to_string(),
            SecurityScheme::Http {
                scheme: "bearer".to_string(),
                bearer_format: Some("JWT".to_string()),
            },
        );
    }
    for api_key in &definitions.api_keys_auth {
        schemes.insert(
            api_key.key.clone(),
            SecurityScheme::ApiKey {
                name: api_key.key.clone(),
                location: api_key.location.as_str().to_string(),
            },
        );
    }
    schemes
}

fn content_type(schema_type: Option<&str>) -> &'static str {
    match schema_type {
        Some("object" | "array") | None => "application/json",
        Some(_) => "text/plain",
    }
}

struct Builder<'a> {
    store: &'a MetadataStore,
    options: &'a SwaggerOptions,
    presence: Presence,
    paths: PathTemplateCache,
    document: OpenApiDocument,
}

impl Builder<'_> {
    fn controller(&mut self, controller: &ControllerInfo) {
        let store = self.store;
        let prefix = controller
            .route_prefix()
            .map(|prefix| prefix.trim_matches('/').to_string());
        let tag_name = prefix.clone().unwrap_or_else(|| "base".to_string());
        let controller_config =
            store.get::<SwaggerConfig>(&controller.owner(), MetadataKey::Swagger);

        self.tag(&tag_name, controller_config.and_then(|config| config.tag.as_ref()));

        for method in &controller.methods {
            let method_config =
                store.get::<SwaggerConfig>(&controller.method_owner(method), MetadataKey::Swagger);

            if !self.is_enabled(controller_config, method_config) {
                tracing::trace!(
                    controller = %controller.name,
                    method = %method.name,
                    "Route excluded from OpenAPI document"
                );
                continue;
            }

            self.method(
                controller,
                method,
                prefix.as_deref(),
                &tag_name,
                controller_config,
                method_config,
            );
        }
    }

    fn tag(&mut self, name: &str, details: Option<&TagDetails>) {
        match self.document.tags.iter_mut().find(|tag| tag.name == name) {
            Some(existing) => {
                if let Some(details) = details {
                    if existing.details.description.is_none() {
                        existing.details.description.clone_from(&details.description);
                    }
                    if existing.details.external_docs.is_none() {
                        existing.details.external_docs.clone_from(&details.external_docs);
                    }
                }
            }
            None => self.document.tags.push(Tag {
                name: name.to_string(),
                details: details.cloned().unwrap_or_default(),
            }),
        }
    }

    fn is_enabled(
        &self,
        controller: Option<&SwaggerConfig>,
        method: Option<&SwaggerConfig>,
    ) -> bool {
        let global = self.options.enable_all_routes.unwrap_or(true);
        let controller = controller.and_then(|config| config.enable).unwrap_or(global);
        method.and_then(|config| config.enable).unwrap_or(controller)
    }

    fn method(
        &mut self,
        controller: &ControllerInfo,
        method: &MethodInfo,
        prefix: Option<&str>,
        tag_name: &str,
        controller_config: Option<&SwaggerConfig>,
        method_config: Option<&SwaggerConfig>,
    ) {
        let store = self.store;
        let owner = controller.method_owner(method);
        let verb = method.http_method.as_lowercase();
        let operation_id = match prefix {
            Some(prefix) => format!("{verb}-{prefix}"),
            None => verb.to_string(),
        };

        let validation = store.get::<ValidationSchema>(&owner, MetadataKey::ValidationSchema);
        let uploads = store
            .get::<Vec<FileUploadSpec>>(&owner, MetadataKey::FileUpload)
            .filter(|uploads| !uploads.is_empty());
        let extra_responses =
            store.get::<Vec<HttpResponseSchema>>(&owner, MetadataKey::ResponseSchemas);

        let parsed = self.paths.get(&method.http_path).clone();

        let summary = method_config
            .and_then(|config| config.summary.clone())
            .or_else(|| controller_config.and_then(|config| config.summary.clone()));

        let parameters = self.parameters(&parsed.path_params, validation);
        let request_body = self.request_body(&operation_id, validation, uploads);

        let responses: Vec<&HttpResponseSchema> = method_config
            .map(|config| config.responses.iter())
            .into_iter()
            .flatten()
            .chain(extra_responses.into_iter().flatten())
            .collect();
        let responses = self.responses(&operation_id, &responses);

        let security = self.security(
            method_config.and_then(|config| config.security.as_ref()),
            controller_config.and_then(|config| config.security.as_ref()),
        );

        let operation = Operation {
            operation_id,
            summary,
            description: method_config.and_then(|config| config.description.clone()),
            tags: vec![tag_name.to_string()],
            parameters,
            request_body,
            security,
            responses,
        };

        self.document
            .paths
            .entry(parsed.documented_path().to_string())
            .or_default()
            .insert(verb.to_string(), operation);
    }

    fn object_properties(&self, schema: &Schema) -> IndexMap<String, SchemaNode> {
        match schema_to_json_schema(&schema.describe(), self.presence) {
            SchemaNode::Object(object) => object.properties.unwrap_or_default(),
            _ => IndexMap::new(),
        }
    }

    fn parameters(
        &self,
        path_params: &[String],
        validation: Option<&ValidationSchema>,
    ) -> Vec<Parameter> {
        let mut described = validation
            .and_then(|schema| schema.params.as_ref())
            .map(|schema| self.object_properties(schema))
            .unwrap_or_default();

        let mut parameters: Vec<Parameter> = path_params
            .iter()
            .map(|name| {
                // Untyped or undescribed segments are documented as strings.
                let mut schema = match described.shift_remove(name) {
                    Some(SchemaNode::Empty) | None => SchemaNode::string(true),
                    Some(schema) => schema,
                };
                schema.set_required(Some(true));
                Parameter {
                    name: name.clone(),
                    location: ParameterIn::Path,
                    schema,
                }
            })
            .collect();

        let sections = [
            (ParameterIn::Header, validation.and_then(|schema| schema.headers.as_ref())),
            (ParameterIn::Query, validation.and_then(|schema| schema.query.as_ref())),
        ];
        for (location, schema) in sections {
            let Some(schema) = schema else { continue };
            parameters.extend(self.object_properties(schema).into_iter().map(|(name, schema)| {
                Parameter {
                    name,
                    location,
                    schema,
                }
            }));
        }

        parameters
    }

    fn request_body(
        &mut self,
        operation_id: &str,
        validation: Option<&ValidationSchema>,
        uploads: Option<&Vec<FileUploadSpec>>,
    ) -> Option<RequestBody> {
        let body = validation.and_then(|schema| schema.body.as_ref());

        if let Some(uploads) = uploads {
            let described = body.map(|body| schema_to_json_schema(&body.describe(), self.presence));
            let mut object = match described {
                Some(SchemaNode::Object(object)) => object,
                _ => ObjectSchema::default(),
            };

            let properties = object.properties.get_or_insert_with(IndexMap::new);
            for upload in uploads {
                properties.insert(upload.name.clone(), file_schema(upload));
            }
            object.required = None;

            let mut content = IndexMap::new();
            content.insert(
                "multipart/form-data".to_string(),
                MediaType {
                    schema: SchemaOrRef::Inline(SchemaNode::Object(object)),
                },
            );
            return Some(RequestBody {
                required: None,
                content,
            });
        }

        let body = body?;
        let node = schema_to_json_schema(&body.describe(), self.presence);
        let key = format!("{operation_id}-body");
        let required = node.required();
        let media = content_type(node.type_name());
        self.document
            .components
            .schemas
            .insert(key.clone(), ComponentSchema::Derived(node));

        let mut content = IndexMap::new();
        content.insert(
            media.to_string(),
            MediaType {
                schema: SchemaOrRef::component(&key),
            },
        );
        Some(RequestBody { required, content })
    }

    fn responses(
        &mut self,
        operation_id: &str,
        declared: &[&HttpResponseSchema],
    ) -> IndexMap<String, ResponseObject> {
        let mut responses = IndexMap::new();

        if declared.is_empty() {
            responses.insert("200".to_string(), ResponseObject::default());
            return responses;
        }

        for response in declared {
            let mut object = ResponseObject {
                description: response.description.clone().unwrap_or_default(),
                content: None,
            };

            if let Some(schema) = &response.schema {
                let key = format!("{operation_id}-response");
                let component = ComponentSchema::Raw(schema.clone());
                let media = content_type(component.type_name());
                self.document.components.schemas.insert(key.clone(), component);

                let schema = if response.is_array {
                    SchemaOrRef::component_array(&key)
                } else {
                    SchemaOrRef::component(&key)
                };
                let mut content = IndexMap::new();
                content.insert(media.to_string(), MediaType { schema });
                object.content = Some(content);
            }

            responses.insert(response.status.to_string(), object);
        }
        responses
    }

    fn security(
        &self,
        method: Option<&SecuritySelection>,
        controller: Option<&SecuritySelection>,
    ) -> Vec<IndexMap<String, Vec<String>>> {
        let registered = &self.document.components.security_schemes;
        let requirement = |name: &str| -> IndexMap<String, Vec<String>> {
            let mut entry = IndexMap::new();
            entry.insert(name.to_string(), Vec::new());
            entry
        };

        let Some(selection) = method.or(controller) else {
            let apply_all = self
                .options
                .security
                .as_ref()
                .is_some_and(|security| security.enable_all_routes);
            return if apply_all {
                registered.keys().map(|name| requirement(name)).collect()
            } else {
                Vec::new()
            };
        };

        let mut selected: Vec<&str> = Vec::new();
        if selection.basic_auth {
            selected.push(BASIC_AUTH);
        }
        if selection.bearer_auth {
            selected.push(BEARER_AUTH);
        }
        selected.extend(selection.api_keys_auth.iter().map(String::as_str));

        selected
            .into_iter()
            .filter(|name| registered.contains_key(*name))
            .map(requirement)
            .collect()
    }
}

fn file_schema(upload: &FileUploadSpec) -> SchemaNode {
    let file = SchemaNode::String(StringSchema {
        format: Some("binary".to_string()),
        ..StringSchema::default()
    });

    if upload.is_multiple() {
        SchemaNode::Array(ArraySchema {
            items: Box::new(file),
            max_items: Some(Number::from(upload.limit())),
            min_items: None,
            required: None,
            default: None,
            description: None,
            example: None,
            unique_items: None,
        })
    } else {
        file
    }
}
