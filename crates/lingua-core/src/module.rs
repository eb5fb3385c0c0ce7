//! Module initialization and the bridge context
//!
//! `ModuleBuilder` is the module initializer: it resolves the host's
//! exception bases first, then collects class families and constant tables.
//! `build()` freezes everything into a `Bridge`, the explicit context every
//! call goes through. A bridge can be installed process-wide exactly once.

use std::cmp::Ordering;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use lingua_sdk::{BridgeError, BridgeResult, HostValue};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;

use crate::defaults::BridgeOptions;
use crate::handle::Handle;
use crate::native::NativeObject;
use crate::translate::{ExceptionClasses, HostException};
use crate::types::{HostClass, TypeRegistry, TypeRegistryBuilder};
use crate::wrapper::{as_wrapper, Wrapper};

static GLOBAL: OnceCell<Bridge> = OnceCell::new();

/// What the bridge needs from the host runtime
pub trait HostEnvironment {
    /// Resolve a well-known host exception class (`Exception`,
    /// `ValueError`), returning its qualified name
    fn exception_base(&self, name: &str) -> Option<String>;
}

/// Module-level constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    /// Integer constant
    Int(i64),
    /// String constant
    Str(&'static str),
}

impl Constant {
    /// Host value of the constant
    pub fn to_value(self) -> HostValue {
        match self {
            Constant::Int(i) => HostValue::Int(i),
            Constant::Str(s) => HostValue::str(s),
        }
    }
}

/// Module initializer
pub struct ModuleBuilder {
    name: String,
    options: BridgeOptions,
    exceptions: ExceptionClasses,
    registry: Option<TypeRegistryBuilder>,
    constants: FxHashMap<&'static str, Vec<(&'static str, Constant)>>,
}

impl ModuleBuilder {
    /// Start a module; fails if the host exception bases cannot be resolved
    pub fn new(name: impl Into<String>, env: &dyn HostEnvironment) -> BridgeResult<Self> {
        let name = name.into();
        let resolve = |base: &str| {
            env.exception_base(base).ok_or_else(|| {
                BridgeError::Module(format!("{}: cannot resolve host exception class {}", name, base))
            })
        };
        let exceptions = ExceptionClasses::new(resolve("Exception")?, resolve("ValueError")?);

        log::debug!("initializing module {}", name);
        Ok(Self {
            name,
            options: BridgeOptions::default(),
            exceptions,
            registry: Some(TypeRegistry::builder()),
            constants: FxHashMap::default(),
        })
    }

    /// Set bridge options
    pub fn options(&mut self, options: BridgeOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Register a class family member
    pub fn add_class(&mut self, class: Arc<HostClass>) -> &mut Self {
        self.registry = self.registry.take().map(|registry| registry.register(class));
        self
    }

    /// A class added earlier, for use as a base class
    pub fn class(&self, name: &str) -> BridgeResult<Arc<HostClass>> {
        self.registry
            .as_ref()
            .and_then(|registry| registry.class(name))
            .cloned()
            .ok_or_else(|| BridgeError::NoSuchClass(name.to_string()))
    }

    /// Add a constant under `scope` (a class or enumeration name)
    pub fn constant(&mut self, scope: &'static str, name: &'static str, value: Constant) -> &mut Self {
        let table = self.constants.entry(scope).or_default();
        match table.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => table.push((name, value)),
        }
        self
    }

    /// Add a table of integer constants under `scope`
    pub fn int_constants(&mut self, scope: &'static str, values: &[(&'static str, i64)]) -> &mut Self {
        for (name, value) in values {
            self.constant(scope, *name, Constant::Int(*value));
        }
        self
    }

    /// Freeze the module into a bridge
    pub fn build(self) -> Bridge {
        let registry = self
            .registry
            .map(TypeRegistryBuilder::build)
            .unwrap_or_default();
        log::info!("module {} ready: {} classes", self.name, registry.len());
        Bridge {
            inner: Arc::new(BridgeInner {
                name: self.name,
                registry,
                options: self.options,
                exceptions: self.exceptions,
                constants: self.constants,
            }),
        }
    }
}

struct BridgeInner {
    name: String,
    registry: TypeRegistry,
    options: BridgeOptions,
    exceptions: ExceptionClasses,
    constants: FxHashMap<&'static str, Vec<(&'static str, Constant)>>,
}

/// Bridge context: registry, options, exception classes and constants
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl Bridge {
    /// Install this bridge as the process-wide one
    pub fn install(self) -> BridgeResult<&'static Bridge> {
        let name = self.inner.name.clone();
        GLOBAL
            .set(self)
            .map_err(|_| BridgeError::Module(format!("{}: a bridge is already installed", name)))?;
        GLOBAL
            .get()
            .ok_or_else(|| BridgeError::Module(format!("{}: install failed", name)))
    }

    /// The process-wide bridge, if one was installed
    pub fn global() -> Option<&'static Bridge> {
        GLOBAL.get()
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.inner.registry
    }

    /// Options
    pub fn options(&self) -> &BridgeOptions {
        &self.inner.options
    }

    /// Exception classes
    pub fn exceptions(&self) -> &ExceptionClasses {
        &self.inner.exceptions
    }

    /// Class by name
    pub fn class(&self, name: &str) -> BridgeResult<&Arc<HostClass>> {
        self.inner
            .registry
            .class(name)
            .ok_or_else(|| BridgeError::NoSuchClass(name.to_string()))
    }

    /// Instantiate a class from host arguments
    pub fn construct(&self, class: &str, args: &[HostValue]) -> BridgeResult<HostValue> {
        let class = self.class(class)?;
        let init = class
            .init()
            .ok_or_else(|| BridgeError::Abstract(class.name().to_string()))?;
        init.invoke(self, class, None, args)
    }

    /// Call a method on a host value.
    ///
    /// Wrapped native objects dispatch through their class; other host
    /// objects handle the call themselves.
    pub fn call_method(&self, this: &HostValue, name: &str, args: &[HostValue]) -> BridgeResult<HostValue> {
        match as_wrapper(this) {
            Some(wrapper) => {
                let class = wrapper.class();
                let method = class.find_method(name).ok_or_else(|| BridgeError::NoSuchMethod {
                    class: class.name().to_string(),
                    method: name.to_string(),
                })?;
                method.invoke(self, class, Some(this), args)
            }
            None => match this.as_object() {
                Some(obj) => obj.call_method(name, args),
                None => Err(BridgeError::NoSuchMethod {
                    class: this.type_name().to_string(),
                    method: name.to_string(),
                }),
            },
        }
    }

    /// Call a static method (factory) of a class
    pub fn call_static(&self, class: &str, name: &str, args: &[HostValue]) -> BridgeResult<HostValue> {
        let class = self.class(class)?;
        let method = class.find_static(name).ok_or_else(|| BridgeError::NoSuchMethod {
            class: class.name().to_string(),
            method: name.to_string(),
        })?;
        method.invoke(self, class, None, args)
    }

    /// Wrap a new native object owned by the host, most-derived registered
    /// class below `declared`
    pub fn wrap_owned(&self, obj: Box<dyn NativeObject>, declared: &str) -> BridgeResult<HostValue> {
        let declared = self.class(declared)?;
        self.inner.registry.wrap_polymorphic(Handle::owned(obj), declared)
    }

    /// Wrap a native object owned elsewhere.
    ///
    /// # Safety
    /// `ptr` must stay valid for as long as the returned wrapper lives. When
    /// the owner is a host object, pass it as `owner` so the wrapper keeps it
    /// alive.
    pub unsafe fn wrap_borrowed(
        &self,
        ptr: NonNull<dyn NativeObject>,
        declared: &str,
        owner: Option<HostValue>,
    ) -> BridgeResult<HostValue> {
        let declared = self.class(declared)?;
        let handle = Handle::borrowed(ptr);
        if let Some(owner) = owner {
            handle.keep_alive(owner);
        }
        self.inner.registry.wrap_polymorphic(handle, declared)
    }

    /// Host `==`: native equality when the class delegates it, identity
    /// otherwise
    pub fn equals(&self, a: &HostValue, b: &HostValue) -> bool {
        match (as_wrapper(a), as_wrapper(b)) {
            (Some(x), Some(y)) => wrapper_eq(x, y),
            (None, None) => match (a, b) {
                (HostValue::Int(x), HostValue::Float(y)) | (HostValue::Float(y), HostValue::Int(x)) => {
                    *x as f64 == *y
                }
                (HostValue::Int(x), HostValue::Int(y)) => x == y,
                (HostValue::Float(x), HostValue::Float(y)) => x == y,
                (HostValue::Str(x), HostValue::Str(y)) => x == y,
                _ => a.is(b),
            },
            _ => false,
        }
    }

    /// Host ordering; only defined for classes with native ordering
    pub fn compare(&self, a: &HostValue, b: &HostValue) -> BridgeResult<Ordering> {
        let unorderable = || BridgeError::TypeMismatch {
            expected: "orderable operands".to_string(),
            got: format!("{} and {}", a.type_name(), b.type_name()),
        };
        let (x, y) = match (as_wrapper(a), as_wrapper(b)) {
            (Some(x), Some(y)) if x.class().rich_compare() => (x, y),
            _ => return Err(unorderable()),
        };
        let policy = self.inner.options.ownership_policy;
        x.native(policy)?
            .native_cmp(y.native(policy)?)
            .ok_or_else(unorderable)
    }

    /// Host exception value for `error`
    pub fn raise(&self, error: BridgeError) -> HostException {
        HostException {
            class: self.inner.exceptions.class_for(&error).clone(),
            error,
        }
    }

    /// Constant `scope.name`
    pub fn constant(&self, scope: &str, name: &str) -> Option<HostValue> {
        self.inner
            .constants
            .get(scope)?
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value.to_value())
    }

    /// All constants of `scope`, in installation order
    pub fn constants(&self, scope: &str) -> Vec<(&'static str, HostValue)> {
        self.inner.constants.get(scope).map_or_else(Vec::new, |table| {
            table.iter().map(|(n, v)| (*n, v.to_value())).collect()
        })
    }
}

fn wrapper_eq(x: &Wrapper, y: &Wrapper) -> bool {
    if x.handle().same_object(y.handle()) {
        return true;
    }
    if !x.class().rich_compare() {
        return false;
    }
    match (x.handle().get(), y.handle().get()) {
        (Some(a), Some(b)) => a.native_eq(b).unwrap_or(false),
        _ => false,
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("name", &self.inner.name)
            .field("classes", &self.inner.registry.len())
            .field("options", &self.inner.options)
            .finish()
    }
}
