//! Route chain construction.
//!
//! [`build_chain`] turns one controller method into its [`MiddlewareChain`].
//! Stages always appear in the same order:
//!
//! 1. guard stage, when any of the method's guards is a flagged auth guard
//!    with a live instance
//! 2. upload stage, when the method accepts files
//! 3. controller middleware, then method middleware, as declared
//! 4. validation stage, when the method declares a schema
//! 5. the bound handler

use crate::error::{ServerError, ServerResult};
use archrest_core::{
    ControllerInfo, ErrorRegistry, FileUploadOptions, FileUploadSpec, GuardExecutor,
    MetadataKey, MetadataStore, MethodInfo,
};
use archrest_middleware::{
    BoxedMiddleware, GuardStage, HandlerStage, MiddlewareChain, UploadStage, ValidationStage,
};
use archrest_validation::{ValidationSchema, ValidationStrategy};
use std::fmt;
use std::sync::Arc;

/// Server-wide inputs to chain construction.
#[derive(Clone, Default)]
pub struct ChainSettings {
    /// Strategy used by validation stages. Required as soon as one route
    /// declares a schema.
    pub validation: Option<Arc<dyn ValidationStrategy>>,
    /// Upload destination and limits.
    pub upload: FileUploadOptions,
    /// Renders handler errors.
    pub errors: Arc<ErrorRegistry>,
}

impl fmt::Debug for ChainSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainSettings")
            .field("validation", &self.validation.is_some())
            .field("upload", &self.upload)
            .finish_non_exhaustive()
    }
}

/// Builds the middleware chain serving `method`.
///
/// # Errors
///
/// Returns [`ServerError::ValidationNotConfigured`] if the method declares a
/// validation schema and `settings` has no validation strategy.
pub fn build_chain(
    controller: &ControllerInfo,
    method: &MethodInfo,
    store: &MetadataStore,
    settings: &ChainSettings,
) -> ServerResult<MiddlewareChain> {
    let class_owner = controller.owner();
    let method_owner = controller.method_owner(method);
    let mut stages: Vec<BoxedMiddleware> = Vec::new();

    if let Some(executor) = GuardExecutor::compose(store, &method.guards) {
        stages.push(Arc::new(GuardStage::new(&method.name, executor)));
    }

    if let Some(fields) = store.get::<Vec<FileUploadSpec>>(&method_owner, MetadataKey::FileUpload) {
        stages.push(Arc::new(UploadStage::new(fields.clone(), settings.upload.clone())));
    }

    for owner in [&class_owner, &method_owner] {
        if let Some(middleware) = store.get::<Vec<BoxedMiddleware>>(owner, MetadataKey::Middleware) {
            stages.extend(middleware.iter().cloned());
        }
    }

    if let Some(schema) = store.get::<ValidationSchema>(&method_owner, MetadataKey::ValidationSchema) {
        let strategy = settings.validation.clone().ok_or_else(|| {
            ServerError::ValidationNotConfigured {
                controller: controller.name.clone(),
                method: method.name.clone(),
            }
        })?;
        stages.push(Arc::new(ValidationStage::new(Arc::new(schema.clone()), strategy)));
    }

    stages.push(Arc::new(HandlerStage::new(
        &method.name,
        Arc::clone(&method.handler),
        Arc::clone(&settings.errors),
    )));

    Ok(MiddlewareChain::new(stages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{auth_guard, ControllerBuilder, RouteBuilder};
    use archrest_core::{
        handler_fn, BoxedHandler, ClassId, FnGuard, GuardInfo, GuardOutcome, Response,
        ResponseExt,
    };
    use archrest_middleware::{FnMiddleware, Middleware};
    use archrest_validation::{Schema, SchemaValidator};
    use http::StatusCode;

    struct ItemsController;
    struct SessionGuard;

    fn ok() -> BoxedHandler {
        handler_fn(|_ctx, _request| async { Ok(Response::empty(StatusCode::OK)) })
    }

    fn named(name: &'static str) -> impl Middleware {
        FnMiddleware::new(name, |ctx, request, next| {
            Box::pin(async move { next.run(ctx, request).await })
        })
    }

    fn settings() -> ChainSettings {
        ChainSettings {
            validation: Some(Arc::new(SchemaValidator::default())),
            ..ChainSettings::default()
        }
    }

    #[test]
    fn test_full_chain_order() {
        let mut store = MetadataStore::new();
        auth_guard::<SessionGuard>(&mut store);
        let guard = GuardInfo::new("SessionGuard", "auth", ClassId::of::<SessionGuard>())
            .with_instance(Arc::new(FnGuard::new(|_, _| GuardOutcome::Allow)));

        let controller = ControllerBuilder::new::<ItemsController>()
            .prefix("items")
            .guard(guard)
            .middleware(named("a"))
            .middleware(named("b"))
            .route(
                RouteBuilder::post("/", "create", ok())
                    .upload("photo")
                    .middleware(named("c"))
                    .validate(ValidationSchema::new().body(Schema::object())),
            )
            .register(&mut store);

        let chain = build_chain(&controller, &controller.methods[0], &store, &settings())
            .expect("chain should build");
        assert_eq!(
            chain.stage_names(),
            vec!["guards", "file-upload", "a", "b", "c", "validation", "handler"]
        );
    }

    #[test]
    fn test_guard_flagged_after_registration_is_composed() {
        let mut store = MetadataStore::new();
        let guard = GuardInfo::new("SessionGuard", "auth", ClassId::of::<SessionGuard>())
            .with_instance(Arc::new(FnGuard::new(|_, _| GuardOutcome::Allow)));
        let controller = ControllerBuilder::new::<ItemsController>()
            .route(RouteBuilder::get("/", "list", ok()).guard(guard))
            .register(&mut store);

        let before = build_chain(&controller, &controller.methods[0], &store, &settings())
            .expect("chain should build");
        assert_eq!(before.stage_names(), vec!["handler"]);

        auth_guard::<SessionGuard>(&mut store);
        let after = build_chain(&controller, &controller.methods[0], &store, &settings())
            .expect("chain should build");
        assert_eq!(after.stage_names(), vec!["guards", "handler"]);
    }

    #[test]
    fn test_minimal_chain_is_handler_only() {
        let mut store = MetadataStore::new();
        let controller = ControllerBuilder::new::<ItemsController>()
            .route(RouteBuilder::get("/", "list", ok()))
            .register(&mut store);

        let chain = build_chain(&controller, &controller.methods[0], &store, &ChainSettings::default())
            .expect("chain should build");
        assert_eq!(chain.stage_names(), vec!["handler"]);
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let mut store = MetadataStore::new();
        let controller = ControllerBuilder::new::<ItemsController>()
            .middleware(named("a"))
            .route(RouteBuilder::get("/", "list", ok()).middleware(named("a")))
            .register(&mut store);

        let method = &controller.methods[0];
        let first = build_chain(&controller, method, &store, &settings()).expect("first build");
        let second = build_chain(&controller, method, &store, &settings()).expect("second build");
        assert_eq!(first.stage_names(), second.stage_names());
        assert_eq!(first.stage_names(), vec!["a", "a", "handler"]);
    }

    #[test]
    fn test_validation_without_strategy_fails() {
        let mut store = MetadataStore::new();
        let controller = ControllerBuilder::new::<ItemsController>()
            .route(
                RouteBuilder::put("/:id", "update", ok())
                    .validate(ValidationSchema::new().params(Schema::object())),
            )
            .register(&mut store);

        let err = build_chain(&controller, &controller.methods[0], &store, &ChainSettings::default())
            .expect_err("validation requires a strategy");
        assert!(matches!(
            err,
            ServerError::ValidationNotConfigured { ref controller, ref method }
                if controller == "ItemsController" && method == "update"
        ));
    }
}
