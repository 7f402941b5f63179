//! The controller model handed over by the host application.

use crate::{
    resolve_prefix, BoxedHandler, ClassId, GuardInfo, HttpVerb, OwnerId,
};
use std::fmt;

/// A controller method registered as a route.
#[derive(Clone)]
pub struct MethodInfo {
    /// Method name, unique within its controller.
    pub name: String,
    /// Declared verb.
    pub http_method: HttpVerb,
    /// Full route path, controller prefix included.
    pub http_path: String,
    /// Guard providers for the route, controller guards first. Composed
    /// against the auth-guard flags when the chain is built.
    pub guards: Vec<GuardInfo>,
    /// The method bound to its controller instance.
    pub handler: BoxedHandler,
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("http_method", &self.http_method)
            .field("http_path", &self.http_path)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

/// A controller and its route methods.
#[derive(Debug, Clone)]
pub struct ControllerInfo {
    /// Controller name.
    pub name: String,
    /// Prefix as declared, before resolution.
    pub prefix: Option<String>,
    /// Identity of the controller class; class-level metadata is keyed by it.
    pub class_id: ClassId,
    /// Route methods in declaration order.
    pub methods: Vec<MethodInfo>,
    /// Guard providers declared on the controller.
    pub guards: Vec<GuardInfo>,
}

impl ControllerInfo {
    /// The resolved route prefix.
    #[must_use]
    pub fn route_prefix(&self) -> Option<String> {
        resolve_prefix(self.prefix.as_deref())
    }

    /// Owner of class-level metadata.
    #[must_use]
    pub fn owner(&self) -> OwnerId {
        OwnerId::class(self.class_id)
    }

    /// Owner of method-level metadata for `method`.
    #[must_use]
    pub fn method_owner(&self, method: &MethodInfo) -> OwnerId {
        OwnerId::method(self.class_id, method.name.clone())
    }
}
