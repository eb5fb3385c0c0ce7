//! Host wrapper objects
//!
//! A `Wrapper` is what host code holds for a native object: the host class
//! chosen by the type registry plus the `Handle` carrying the pointer.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use lingua_sdk::{BridgeError, BridgeResult, HostObject, HostValue};

use crate::defaults::OwnershipPolicy;
use crate::handle::Handle;
use crate::native::NativeObject;
use crate::types::HostClass;

/// Host object wrapping one native object
pub struct Wrapper {
    class: Arc<HostClass>,
    handle: Handle,
}

impl Wrapper {
    /// Wrap `handle` as an instance of `class`
    pub fn new(class: Arc<HostClass>, handle: Handle) -> Self {
        Self { class, handle }
    }

    /// Host class of this wrapper
    pub fn class(&self) -> &Arc<HostClass> {
        &self.class
    }

    /// Underlying handle
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// The native object; detached handles are reported per `policy`
    pub fn native(&self, policy: OwnershipPolicy) -> BridgeResult<&dyn NativeObject> {
        self.handle.native(policy)
    }

    /// Downcast the native object to a concrete class
    pub fn downcast<T: NativeObject>(&self, policy: OwnershipPolicy) -> BridgeResult<&T> {
        let native = self.native(policy)?;
        native
            .downcast_ref::<T>()
            .ok_or_else(|| BridgeError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                got: native.type_info().name().to_string(),
            })
    }

    /// Whether the wrapper is an instance of the host class `name`
    pub fn is_instance(&self, name: &str) -> bool {
        self.class.is_subclass_of(name)
    }
}

impl HostObject for Wrapper {
    fn type_name(&self) -> &str {
        self.class.name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("class", &self.class.name())
            .field("handle", &self.handle)
            .finish()
    }
}

/// Get the wrapper inside a host value
pub fn as_wrapper(value: &HostValue) -> Option<&Wrapper> {
    value.downcast_ref::<Wrapper>()
}
