//! Host wrapper classes
//!
//! A `HostClass` is the host-visible type of one native class family: its
//! constructor, instance methods and static factories (each an ordered
//! overload list), its base class and whether it delegates comparison to
//! the native object.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::native::{NativeTypeId, NativeTypeInfo};
use crate::resolver::{Method, MethodBuilder};

/// Host-visible wrapper type for a native class
pub struct HostClass {
    name: &'static str,
    native: &'static NativeTypeInfo,
    base: Option<Arc<HostClass>>,
    init: Option<Method>,
    methods: FxHashMap<&'static str, Method>,
    statics: FxHashMap<&'static str, Method>,
    rich_compare: bool,
}

impl HostClass {
    /// Start building a class wrapping the native type `native`
    pub fn builder(name: &'static str, native: &'static NativeTypeInfo) -> ClassBuilder {
        ClassBuilder {
            name,
            native,
            base: None,
            init: None,
            methods: FxHashMap::default(),
            statics: FxHashMap::default(),
            rich_compare: false,
        }
    }

    /// Host class name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wrapped native type
    pub fn native_type(&self) -> &'static NativeTypeInfo {
        self.native
    }

    /// Wrapped native type identity
    pub fn native_id(&self) -> NativeTypeId {
        self.native.id()
    }

    /// Host base class
    pub fn base(&self) -> Option<&Arc<HostClass>> {
        self.base.as_ref()
    }

    /// Classes without a constructor cannot be instantiated from the host
    pub fn is_abstract(&self) -> bool {
        self.init.is_none()
    }

    /// Constructor overloads
    pub fn init(&self) -> Option<&Method> {
        self.init.as_ref()
    }

    /// Whether `==`/ordering delegate to the native object
    pub fn rich_compare(&self) -> bool {
        self.rich_compare || self.base.as_ref().map_or(false, |b| b.rich_compare())
    }

    /// Whether this class is `name` or inherits from it
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.mro().any(|class| class.name == name)
    }

    /// This class followed by its bases
    pub fn mro(&self) -> impl Iterator<Item = &HostClass> {
        std::iter::successors(Some(self), |class| class.base.as_deref())
    }

    /// Instance method lookup, including inherited methods
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.mro().find_map(|class| class.methods.get(name))
    }

    /// Static method lookup, including inherited statics
    pub fn find_static(&self, name: &str) -> Option<&Method> {
        self.mro().find_map(|class| class.statics.get(name))
    }

    /// Names of the methods declared directly on this class
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostClass")
            .field("name", &self.name)
            .field("native", &self.native.name())
            .field("base", &self.base.as_ref().map(|b| b.name))
            .field("abstract", &self.is_abstract())
            .field("methods", &format!("<{} methods>", self.methods.len()))
            .field("statics", &format!("<{} statics>", self.statics.len()))
            .finish()
    }
}

/// Builder for `HostClass`
pub struct ClassBuilder {
    name: &'static str,
    native: &'static NativeTypeInfo,
    base: Option<Arc<HostClass>>,
    init: Option<Method>,
    methods: FxHashMap<&'static str, Method>,
    statics: FxHashMap<&'static str, Method>,
    rich_compare: bool,
}

impl ClassBuilder {
    /// Set the host base class
    pub fn base(mut self, base: &Arc<HostClass>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    /// Define the constructor overloads
    pub fn init(mut self, build: impl FnOnce(MethodBuilder) -> MethodBuilder) -> Self {
        let qualified = format!("{}.__init__", self.name);
        self.init = Some(build(Method::builder(qualified)).build());
        self
    }

    /// Define an instance method
    pub fn method(
        mut self,
        name: &'static str,
        build: impl FnOnce(MethodBuilder) -> MethodBuilder,
    ) -> Self {
        let qualified = format!("{}.{}", self.name, name);
        self.methods
            .insert(name, build(Method::builder(qualified)).build());
        self
    }

    /// Define a static (class-level) method, typically a factory
    pub fn static_method(
        mut self,
        name: &'static str,
        build: impl FnOnce(MethodBuilder) -> MethodBuilder,
    ) -> Self {
        let qualified = format!("{}.{}", self.name, name);
        self.statics
            .insert(name, build(Method::builder(qualified)).build());
        self
    }

    /// Delegate `==` and ordering to the native object
    pub fn rich_compare(mut self) -> Self {
        self.rich_compare = true;
        self
    }

    /// Finish the class
    pub fn build(self) -> Arc<HostClass> {
        debug_assert!(
            self.base
                .as_ref()
                .map_or(true, |base| self.native.is_a(base.native_id())),
            "native type of {} must derive from its base class' native type",
            self.name
        );
        Arc::new(HostClass {
            name: self.name,
            native: self.native,
            base: self.base,
            init: self.init,
            methods: self.methods,
            statics: self.statics,
            rich_compare: self.rich_compare,
        })
    }
}
