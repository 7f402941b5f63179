//! Class and method scoped metadata storage.
//!
//! Controller declarations write their annotations here once, during
//! bootstrap. The chain builder and the OpenAPI synthesizer read them back
//! when the server starts. Values are stored type-erased and recovered by
//! downcasting, the same way a service container resolves services.
//!
//! # Example
//!
//! ```
//! use archrest_core::metadata::{ClassId, MetadataKey, MetadataStore, OwnerId};
//!
//! struct UsersController;
//!
//! let mut store = MetadataStore::new();
//! let owner = OwnerId::method(ClassId::of::<UsersController>(), "find");
//! store.set(owner.clone(), MetadataKey::Swagger, "summary".to_string());
//!
//! let value: Option<&String> = store.get(&owner, MetadataKey::Swagger);
//! assert_eq!(value.map(String::as_str), Some("summary"));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity token of a controller or guard class.
#[derive(Clone, Copy)]
pub struct ClassId {
    type_id: TypeId,
    name: &'static str,
}

impl ClassId {
    /// Returns the identity of type `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the last path segment of the type name.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassId").field(&self.name).finish()
    }
}

/// The scope an annotation is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerId {
    /// A class-level annotation.
    Class(ClassId),
    /// A method-level annotation, keyed by class and method name.
    Method(ClassId, String),
}

impl OwnerId {
    /// Class scope.
    #[must_use]
    pub const fn class(class: ClassId) -> Self {
        Self::Class(class)
    }

    /// Method scope.
    #[must_use]
    pub fn method(class: ClassId, name: impl Into<String>) -> Self {
        Self::Method(class, name.into())
    }
}

/// Annotation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// Verb and path of a route method.
    Route,
    /// Ordered middleware list (class or method).
    Middleware,
    /// Validation schema of a method.
    ValidationSchema,
    /// Normalized file-upload entries of a method.
    FileUpload,
    /// Swagger documentation config (class or method).
    Swagger,
    /// Declared response schemas of a method.
    ResponseSchemas,
    /// Authentication guard flag of a guard class.
    AuthGuard,
}

#[derive(Debug, Clone, Copy)]
struct AuthGuardFlag;

/// Annotation storage keyed by owner and annotation kind.
#[derive(Default, Clone)]
pub struct MetadataStore {
    entries: HashMap<OwnerId, HashMap<MetadataKey, Arc<dyn Any + Send + Sync>>>,
}

impl MetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `owner` under `key`, replacing any previous value.
    ///
    /// The authentication guard flag can only be set through
    /// [`mark_auth_guard`](Self::mark_auth_guard); writes to
    /// [`MetadataKey::AuthGuard`] are ignored here.
    pub fn set<T: Send + Sync + 'static>(&mut self, owner: OwnerId, key: MetadataKey, value: T) {
        if key == MetadataKey::AuthGuard {
            tracing::debug!(?owner, "Ignoring direct write to the auth guard flag");
            return;
        }
        self.entries
            .entry(owner)
            .or_default()
            .insert(key, Arc::new(value));
    }

    /// Returns the value stored for `owner` under `key`.
    ///
    /// Returns `None` when nothing is stored or the stored value has another type.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, owner: &OwnerId, key: MetadataKey) -> Option<&T> {
        self.entries
            .get(owner)
            .and_then(|values| values.get(&key))
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns `true` if anything is stored for `owner` under `key`.
    #[must_use]
    pub fn contains(&self, owner: &OwnerId, key: MetadataKey) -> bool {
        self.entries
            .get(owner)
            .is_some_and(|values| values.contains_key(&key))
    }

    /// Flags a guard class as an authentication guard. The flag is never cleared.
    pub fn mark_auth_guard(&mut self, class: ClassId) {
        self.entries
            .entry(OwnerId::Class(class))
            .or_default()
            .insert(MetadataKey::AuthGuard, Arc::new(AuthGuardFlag));
    }

    /// Returns `true` if the guard class was flagged with [`mark_auth_guard`](Self::mark_auth_guard).
    #[must_use]
    pub fn is_auth_guard(&self, class: ClassId) -> bool {
        self.contains(&OwnerId::Class(class), MetadataKey::AuthGuard)
    }

    /// Returns the number of owners with at least one annotation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore")
            .field("owners", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Users;
    struct Orders;

    #[test]
    fn test_class_and_method_scopes_are_distinct() {
        let mut store = MetadataStore::new();
        let class = ClassId::of::<Users>();
        store.set(OwnerId::class(class), MetadataKey::Middleware, vec!["a"]);
        store.set(OwnerId::method(class, "find"), MetadataKey::Middleware, vec!["b"]);

        let class_level: &Vec<&str> = store.get(&OwnerId::class(class), MetadataKey::Middleware).unwrap();
        let method_level: &Vec<&str> = store
            .get(&OwnerId::method(class, "find"), MetadataKey::Middleware)
            .unwrap();
        assert_eq!(class_level, &vec!["a"]);
        assert_eq!(method_level, &vec!["b"]);
    }

    #[test]
    fn test_get_with_wrong_type_is_none() {
        let mut store = MetadataStore::new();
        let owner = OwnerId::class(ClassId::of::<Users>());
        store.set(owner.clone(), MetadataKey::Swagger, 42_u32);
        assert!(store.get::<String>(&owner, MetadataKey::Swagger).is_none());
        assert_eq!(store.get::<u32>(&owner, MetadataKey::Swagger), Some(&42));
    }

    #[test]
    fn test_auth_guard_flag() {
        let mut store = MetadataStore::new();
        store.mark_auth_guard(ClassId::of::<Users>());
        assert!(store.is_auth_guard(ClassId::of::<Users>()));
        assert!(!store.is_auth_guard(ClassId::of::<Orders>()));

        // direct writes cannot clear the flag
        store.set(OwnerId::class(ClassId::of::<Users>()), MetadataKey::AuthGuard, false);
        assert!(store.is_auth_guard(ClassId::of::<Users>()));
    }

    #[test]
    fn test_class_id_names() {
        let id = ClassId::of::<Users>();
        assert_eq!(id.short_name(), "Users");
        assert_ne!(id, ClassId::of::<Orders>());
    }
}
