//! Authentication guards and their composition.
//!
//! A guard inspects a request before any other route stage runs and answers
//! with an explicit [`GuardOutcome`]. Only guard classes flagged with
//! [`MetadataStore::mark_auth_guard`] and backed by a live instance take part
//! in a route's guard stage.

use crate::{BoxFuture, ClassId, MetadataStore, Request, RequestContext, Response};
use std::fmt;
use std::sync::Arc;

/// The result of a guard check.
#[derive(Debug)]
pub enum GuardOutcome {
    /// The request may continue.
    Allow,
    /// The request is rejected.
    ///
    /// `Some` carries the response the guard wants to send; `None` means the
    /// guard rejected without producing one.
    Deny(Option<Response>),
    /// The guard itself failed.
    Error(anyhow::Error),
}

impl GuardOutcome {
    /// Returns `true` for [`GuardOutcome::Allow`].
    #[must_use]
    pub const fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// An asynchronous request check.
pub trait Guard: Send + Sync + 'static {
    /// Checks the request.
    fn check<'a>(&'a self, ctx: &'a RequestContext, request: &'a Request)
        -> BoxFuture<'a, GuardOutcome>;
}

/// A guard backed by a synchronous closure.
///
/// ```
/// use archrest_core::{FnGuard, GuardOutcome};
///
/// let guard = FnGuard::new(|_ctx, request| {
///     if request.headers().contains_key("authorization") {
///         GuardOutcome::Allow
///     } else {
///         GuardOutcome::Deny(None)
///     }
/// });
/// ```
pub struct FnGuard<F> {
    func: F,
}

impl<F> FnGuard<F>
where
    F: Fn(&RequestContext, &Request) -> GuardOutcome + Send + Sync + 'static,
{
    /// Wraps a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Guard for FnGuard<F>
where
    F: Fn(&RequestContext, &Request) -> GuardOutcome + Send + Sync + 'static,
{
    fn check<'a>(
        &'a self,
        ctx: &'a RequestContext,
        request: &'a Request,
    ) -> BoxFuture<'a, GuardOutcome> {
        let outcome = (self.func)(ctx, request);
        Box::pin(async move { outcome })
    }
}

/// A guard provider known to the host application.
#[derive(Clone)]
pub struct GuardInfo {
    /// Provider name.
    pub name: String,
    /// Name of the module declaring the provider.
    pub module_name: String,
    /// Identity of the provider class; the auth-guard flag is keyed by it.
    pub class_id: ClassId,
    /// The live instance, if the provider was instantiated.
    pub instance: Option<Arc<dyn Guard>>,
}

impl GuardInfo {
    /// Describes a provider without a live instance.
    #[must_use]
    pub fn new(name: impl Into<String>, module_name: impl Into<String>, class_id: ClassId) -> Self {
        Self {
            name: name.into(),
            module_name: module_name.into(),
            class_id,
            instance: None,
        }
    }

    /// Describes a live guard instance of type `G`.
    #[must_use]
    pub fn of<G: Guard>(module_name: impl Into<String>, instance: Arc<G>) -> Self {
        let class_id = ClassId::of::<G>();
        Self {
            name: class_id.short_name().to_string(),
            module_name: module_name.into(),
            class_id,
            instance: Some(instance),
        }
    }

    /// Attaches a live instance.
    #[must_use]
    pub fn with_instance(mut self, instance: Arc<dyn Guard>) -> Self {
        self.instance = Some(instance);
        self
    }
}

impl fmt::Debug for GuardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardInfo")
            .field("name", &self.name)
            .field("module_name", &self.module_name)
            .field("class_id", &self.class_id)
            .field("instance", &self.instance.is_some())
            .finish()
    }
}

/// Selects the executable guards among `guards`, preserving declaration order.
///
/// A guard is kept when its class carries the auth-guard flag and it has a
/// live instance. Everything else is skipped silently.
#[must_use]
pub fn compose_guards(store: &MetadataStore, guards: &[GuardInfo]) -> Vec<Arc<dyn Guard>> {
    guards
        .iter()
        .filter(|info| store.is_auth_guard(info.class_id))
        .filter_map(|info| info.instance.clone())
        .collect()
}

/// Runs composed guards one after another.
#[derive(Clone)]
pub struct GuardExecutor {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardExecutor {
    /// Wraps already composed guards.
    #[must_use]
    pub fn new(guards: Vec<Arc<dyn Guard>>) -> Self {
        Self { guards }
    }

    /// Composes `guards` and returns an executor, or `None` if none qualify.
    #[must_use]
    pub fn compose(store: &MetadataStore, guards: &[GuardInfo]) -> Option<Self> {
        let composed = compose_guards(store, guards);
        (!composed.is_empty()).then(|| Self::new(composed))
    }

    /// Number of guards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// Returns `true` if there are no guards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Runs every guard in order.
    ///
    /// Stops at the first outcome that is not [`GuardOutcome::Allow`] and
    /// returns it; later guards are not invoked.
    pub async fn run(&self, ctx: &RequestContext, request: &Request) -> GuardOutcome {
        for guard in &self.guards {
            match guard.check(ctx, request).await {
                GuardOutcome::Allow => {}
                outcome => return outcome,
            }
        }
        GuardOutcome::Allow
    }
}

impl fmt::Debug for GuardExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardExecutor")
            .field("guards", &self.guards.len())
            .finish()
    }
}
