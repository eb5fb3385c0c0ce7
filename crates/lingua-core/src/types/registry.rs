//! Type registry for native run-time type information
//!
//! The type registry maps a native dynamic-type identity to the host class
//! that wraps it. It is populated once, at module initialization, and is
//! read-only afterwards; clones share the same tables.

use std::sync::Arc;

use lingua_sdk::{BridgeError, BridgeResult, HostValue};
use rustc_hash::FxHashMap;

use super::class::HostClass;
use crate::handle::Handle;
use crate::native::{NativeTypeId, NativeTypeInfo};
use crate::wrapper::Wrapper;

/// Registry of host classes by native type
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    by_type: Arc<FxHashMap<NativeTypeId, Arc<HostClass>>>,
    by_name: Arc<FxHashMap<&'static str, Arc<HostClass>>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry builder
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder {
            by_type: FxHashMap::default(),
            by_name: FxHashMap::default(),
        }
    }

    /// Host class registered for a native type
    pub fn get(&self, id: NativeTypeId) -> Option<&Arc<HostClass>> {
        self.by_type.get(&id)
    }

    /// Host class by name
    pub fn class(&self, name: &str) -> Option<&Arc<HostClass>> {
        self.by_name.get(name)
    }

    /// Check if a native type is registered
    pub fn contains(&self, id: NativeTypeId) -> bool {
        self.by_type.contains_key(&id)
    }

    /// Get the number of registered classes
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    /// Pick the host class for an object of dynamic type `dynamic` reached
    /// through a pointer statically typed as `declared`.
    ///
    /// Walks the native ancestry from the most-derived type towards the root
    /// and returns the first registered class that is `declared` or one of
    /// its subclasses; falls back to `declared`.
    pub fn resolve(
        &self,
        dynamic: &'static NativeTypeInfo,
        declared: &Arc<HostClass>,
    ) -> BridgeResult<Arc<HostClass>> {
        if !dynamic.is_a(declared.native_id()) {
            return Err(BridgeError::TypeMismatch {
                expected: declared.native_type().name().to_string(),
                got: dynamic.name().to_string(),
            });
        }

        for info in dynamic.ancestry() {
            if let Some(class) = self.get(info.id()) {
                if class.is_subclass_of(declared.name()) {
                    if info.id() != dynamic.id() {
                        log::debug!(
                            "no host class for {}; wrapping as {}",
                            dynamic.name(),
                            class.name()
                        );
                    }
                    return Ok(Arc::clone(class));
                }
            }
        }

        log::debug!(
            "no registered ancestor of {} below {}; using the declared class",
            dynamic.name(),
            declared.name()
        );
        Ok(Arc::clone(declared))
    }

    /// Wrap a native object in its most-derived registered host class.
    ///
    /// The handle is consumed either way; on error an Owned object is
    /// released with it.
    pub fn wrap_polymorphic(&self, handle: Handle, declared: &Arc<HostClass>) -> BridgeResult<HostValue> {
        let dynamic = match handle.get() {
            Some(native) => native.type_info(),
            None => {
                return Err(BridgeError::OwnershipViolation(format!(
                    "cannot wrap adopted {} object",
                    handle.type_name()
                )))
            }
        };
        let class = self.resolve(dynamic, declared)?;
        Ok(HostValue::object(Wrapper::new(class, handle)))
    }
}

/// Builder for TypeRegistry
pub struct TypeRegistryBuilder {
    by_type: FxHashMap<NativeTypeId, Arc<HostClass>>,
    by_name: FxHashMap<&'static str, Arc<HostClass>>,
}

impl TypeRegistryBuilder {
    /// Register a class; a later registration for the same native type wins
    pub fn register(mut self, class: Arc<HostClass>) -> Self {
        log::debug!("registering {} for native {}", class.name(), class.native_id());
        if let Some(previous) = self.by_type.insert(class.native_id(), Arc::clone(&class)) {
            log::debug!(
                "native {} was bound to {}; now bound to {}",
                class.native_id(),
                previous.name(),
                class.name()
            );
        }
        self.by_name.insert(class.name(), class);
        self
    }

    /// Host class registered so far, by name
    pub fn class(&self, name: &str) -> Option<&Arc<HostClass>> {
        self.by_name.get(name)
    }

    /// Build the registry
    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            by_type: Arc::new(self.by_type),
            by_name: Arc::new(self.by_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeObject;

    static SHAPE: NativeTypeInfo = NativeTypeInfo::root("Shape");
    static POLYGON: NativeTypeInfo = NativeTypeInfo::derived("Polygon", &SHAPE);
    static SQUARE: NativeTypeInfo = NativeTypeInfo::derived("Square", &POLYGON);
    static OTHER: NativeTypeInfo = NativeTypeInfo::root("Other");

    struct Dyn(&'static NativeTypeInfo);

    impl NativeObject for Dyn {
        fn type_info(&self) -> &'static NativeTypeInfo {
            self.0
        }

        crate::native_any!();
    }

    fn registry() -> (TypeRegistry, Arc<HostClass>) {
        let shape = HostClass::builder("Shape", &SHAPE).build();
        let polygon = HostClass::builder("Polygon", &POLYGON).base(&shape).build();
        let registry = TypeRegistry::builder()
            .register(Arc::clone(&shape))
            .register(polygon)
            .build();
        (registry, shape)
    }

    fn wrapped_class(value: &HostValue) -> &'static str {
        value.downcast_ref::<Wrapper>().unwrap().class().name()
    }

    #[test]
    fn test_most_derived_registered_class() {
        let (registry, shape) = registry();
        let value = registry
            .wrap_polymorphic(Handle::owned(Box::new(Dyn(&POLYGON))), &shape)
            .unwrap();
        assert_eq!(wrapped_class(&value), "Polygon");
    }

    #[test]
    fn test_unregistered_type_uses_registered_ancestor() {
        let (registry, shape) = registry();
        let value = registry
            .wrap_polymorphic(Handle::owned(Box::new(Dyn(&SQUARE))), &shape)
            .unwrap();
        assert_eq!(wrapped_class(&value), "Polygon");
    }

    #[test]
    fn test_deterministic() {
        let (registry, shape) = registry();
        let first = registry.resolve(&SQUARE, &shape).unwrap();
        let second = registry.resolve(&SQUARE, &shape).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unrelated_type_rejected() {
        let (registry, shape) = registry();
        let err = registry
            .wrap_polymorphic(Handle::owned(Box::new(Dyn(&OTHER))), &shape)
            .unwrap_err();
        assert!(matches!(err, BridgeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_last_registration_wins() {
        let first = HostClass::builder("Shape", &SHAPE).build();
        let second = HostClass::builder("Figure", &SHAPE).build();
        let registry = TypeRegistry::builder()
            .register(first)
            .register(Arc::clone(&second))
            .build();
        assert!(Arc::ptr_eq(registry.get(SHAPE.id()).unwrap(), &second));
        assert_eq!(registry.len(), 1);
    }
}
