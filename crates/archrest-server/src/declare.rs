//! Controller declaration.
//!
//! Controllers are described with explicit builders, run once during
//! bootstrap. [`ControllerBuilder::register`] writes every annotation into
//! the [`MetadataStore`] and returns the [`ControllerInfo`] the server mounts
//! and documents.
//!
//! ```
//! use archrest_core::{bind, HandlerResult, MetadataStore, Request, RequestContext, Response, ResponseExt};
//! use archrest_server::{ControllerBuilder, RouteBuilder};
//! use http::StatusCode;
//! use std::sync::Arc;
//!
//! struct UsersController;
//!
//! impl UsersController {
//!     async fn find(self: Arc<Self>, ctx: RequestContext, _req: Request) -> HandlerResult {
//!         Ok(Response::text(StatusCode::OK, ctx.param("id").unwrap_or_default().to_string()))
//!     }
//! }
//!
//! let users = Arc::new(UsersController);
//! let mut store = MetadataStore::new();
//! let controller = ControllerBuilder::new::<UsersController>()
//!     .prefix("users")
//!     .route(RouteBuilder::get("/:id", "find", bind(users, UsersController::find)))
//!     .register(&mut store);
//!
//! assert_eq!(controller.methods[0].http_path, "/users/:id");
//! ```

use archrest_core::{
    join_route_path, BoxedHandler, ClassId, ControllerInfo, FileUploadSpec, GuardInfo, HttpVerb, MetadataKey, MetadataStore, MethodInfo, OwnerId, RouteInfo,
    UploadFields,
};
use archrest_docs::{HttpResponseSchema, SwaggerConfig};
use archrest_middleware::{BoxedMiddleware, Middleware};
use archrest_validation::ValidationSchema;
use std::sync::Arc;

/// Flags guard class `G` as an authentication guard.
///
/// Only flagged guards take part in guard composition, which happens when
/// the route chains are built. Flagging order relative to controller
/// registration does not matter.
pub fn auth_guard<G: ?Sized + 'static>(store: &mut MetadataStore) {
    store.mark_auth_guard(ClassId::of::<G>());
}

/// A controller method being declared.
pub struct RouteBuilder {
    name: String,
    route: RouteInfo,
    handler: BoxedHandler,
    middleware: Vec<BoxedMiddleware>,
    validation: Option<ValidationSchema>,
    upload: Option<Vec<FileUploadSpec>>,
    swagger: Option<SwaggerConfig>,
    responses: Option<Vec<HttpResponseSchema>>,
    guards: Vec<GuardInfo>,
}

macro_rules! verb_constructor {
    ($($fn_name:ident => $verb:ident),* $(,)?) => {
        $(
            #[doc = concat!("Declares a `", stringify!($verb), "` route.")]
            #[must_use]
            pub fn $fn_name(path: &str, name: &str, handler: BoxedHandler) -> Self {
                Self::new(HttpVerb::$verb, Some(path), name, handler)
            }
        )*
    };
}

impl RouteBuilder {
    /// Declares a route. An absent path means `/`.
    #[must_use]
    pub fn new(verb: HttpVerb, path: Option<&str>, name: &str, handler: BoxedHandler) -> Self {
        Self {
            name: name.to_string(),
            route: RouteInfo::new(verb, path),
            handler,
            middleware: Vec::new(),
            validation: None,
            upload: None,
            swagger: None,
            responses: None,
            guards: Vec::new(),
        }
    }

    verb_constructor! {
        get => Get,
        post => Post,
        put => Put,
        delete => Delete,
        head => Head,
        patch => Patch,
        options => Options,
        all => All,
    }

    /// Appends method-level middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends already boxed method-level middleware.
    #[must_use]
    pub fn boxed_middleware(mut self, middleware: impl IntoIterator<Item = BoxedMiddleware>) -> Self {
        self.middleware.extend(middleware);
        self
    }

    /// Validates requests against `schema`.
    #[must_use]
    pub fn validate(mut self, schema: ValidationSchema) -> Self {
        self.validation = Some(schema);
        self
    }

    /// Accepts multipart uploads for the given fields.
    #[must_use]
    pub fn upload(mut self, fields: impl Into<UploadFields>) -> Self {
        self.upload = Some(fields.into().normalize());
        self
    }

    /// Sets the documentation config of this route.
    #[must_use]
    pub fn swagger(mut self, config: SwaggerConfig) -> Self {
        self.swagger = Some(config);
        self
    }

    /// Declares documented response schemas.
    #[must_use]
    pub fn responses(mut self, responses: Vec<HttpResponseSchema>) -> Self {
        self.responses = Some(responses);
        self
    }

    /// Adds a guard provider to this route.
    #[must_use]
    pub fn guard(mut self, guard: GuardInfo) -> Self {
        self.guards.push(guard);
        self
    }
}

/// A controller being declared.
pub struct ControllerBuilder {
    class_id: ClassId,
    name: String,
    prefix: Option<String>,
    middleware: Vec<BoxedMiddleware>,
    swagger: Option<SwaggerConfig>,
    guards: Vec<GuardInfo>,
    routes: Vec<RouteBuilder>,
}

impl ControllerBuilder {
    /// Declares a controller whose class identity is `C`.
    #[must_use]
    pub fn new<C: ?Sized + 'static>() -> Self {
        let class_id = ClassId::of::<C>();
        Self {
            class_id,
            name: class_id.short_name().to_string(),
            prefix: None,
            middleware: Vec::new(),
            swagger: None,
            guards: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Sets the route prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Overrides the controller name used in logs and errors.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Appends controller-level middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Sets the documentation config of the controller.
    #[must_use]
    pub fn swagger(mut self, config: SwaggerConfig) -> Self {
        self.swagger = Some(config);
        self
    }

    /// Adds a guard provider applying to every route.
    #[must_use]
    pub fn guard(mut self, guard: GuardInfo) -> Self {
        self.guards.push(guard);
        self
    }

    /// Adds a route method.
    #[must_use]
    pub fn route(mut self, route: RouteBuilder) -> Self {
        self.routes.push(route);
        self
    }

    /// Writes the annotations into `store` and returns the controller model.
    ///
    /// Guard providers are recorded, controller guards before route guards.
    /// They are composed later, when the route chain is built.
    pub fn register(self, store: &mut MetadataStore) -> ControllerInfo {
        let class_owner = OwnerId::class(self.class_id);
        if !self.middleware.is_empty() {
            store.set(class_owner.clone(), MetadataKey::Middleware, self.middleware);
        }
        if let Some(swagger) = self.swagger {
            store.set(class_owner, MetadataKey::Swagger, swagger);
        }

        let mut methods = Vec::with_capacity(self.routes.len());
        for route in self.routes {
            let owner = OwnerId::method(self.class_id, route.name.clone());

            if !route.middleware.is_empty() {
                store.set(owner.clone(), MetadataKey::Middleware, route.middleware);
            }
            if let Some(schema) = route.validation {
                store.set(owner.clone(), MetadataKey::ValidationSchema, schema);
            }
            if let Some(upload) = route.upload {
                store.set(owner.clone(), MetadataKey::FileUpload, upload);
            }
            if let Some(swagger) = route.swagger {
                store.set(owner.clone(), MetadataKey::Swagger, swagger);
            }
            if let Some(responses) = route.responses {
                store.set(owner.clone(), MetadataKey::ResponseSchemas, responses);
            }

            let guards: Vec<GuardInfo> = self
                .guards
                .iter()
                .cloned()
                .chain(route.guards)
                .collect();

            methods.push(MethodInfo {
                name: route.name,
                http_method: route.route.method,
                http_path: join_route_path(self.prefix.as_deref(), &route.route.path),
                guards,
                handler: route.handler,
            });
            store.set(owner, MetadataKey::Route, route.route);
        }

        ControllerInfo {
            name: self.name,
            prefix: self.prefix,
            class_id: self.class_id,
            methods,
            guards: self.guards,
        }
    }
}
