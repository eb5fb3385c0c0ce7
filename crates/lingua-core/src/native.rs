//! Native object model
//!
//! Every class of the wrapped library is seen by the engine through the
//! `NativeObject` trait. Run-time type information is a static chain of
//! `NativeTypeInfo` records (most-derived first), the equivalent of the
//! native library's RTTI: it is what the type registry inspects to find the
//! most-derived host wrapper for an object reached through a base pointer.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;

/// Identity of a native dynamic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeTypeId(&'static str);

impl NativeTypeId {
    /// Native class name
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for NativeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Static RTTI record of a native class
#[derive(Debug)]
pub struct NativeTypeInfo {
    name: &'static str,
    parent: Option<&'static NativeTypeInfo>,
}

impl NativeTypeInfo {
    /// A class without a native base class
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// A class deriving from `parent`
    pub const fn derived(name: &'static str, parent: &'static NativeTypeInfo) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Type identity
    pub fn id(&self) -> NativeTypeId {
        NativeTypeId(self.name)
    }

    /// Native class name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Direct base class
    pub fn parent(&self) -> Option<&'static NativeTypeInfo> {
        self.parent
    }

    /// Walk from this type to the root, most-derived first
    pub fn ancestry(&'static self) -> impl Iterator<Item = &'static NativeTypeInfo> {
        std::iter::successors(Some(self), |info| info.parent)
    }

    /// Whether this type is `id` or derives from it
    pub fn is_a(&'static self, id: NativeTypeId) -> bool {
        self.ancestry().any(|info| info.id() == id)
    }
}

/// A native object reachable from a `Handle`.
///
/// Methods take `&self`: native classes with mutable state carry their own
/// interior mutability, the engine never hands out `&mut` to native objects.
pub trait NativeObject: Any + Send + Sync {
    /// Dynamic type of this object
    fn type_info(&self) -> &'static NativeTypeInfo;

    /// Polymorphic copy (`clone()` in the native library)
    fn clone_native(&self) -> Option<Box<dyn NativeObject>> {
        None
    }

    /// Native `operator==`, if the class defines one
    fn native_eq(&self, _other: &dyn NativeObject) -> Option<bool> {
        None
    }

    /// Native ordering, if the class defines one
    fn native_cmp(&self, _other: &dyn NativeObject) -> Option<Ordering> {
        None
    }

    /// Text content, for classes usable wherever a string is expected
    fn as_text(&self) -> Option<String> {
        None
    }

    /// Upcast for downcasting to the concrete class
    fn as_any(&self) -> &dyn Any;

    /// Owned upcast, used when native code adopts an object
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn NativeObject {
    /// Downcast to a concrete native class
    pub fn downcast_ref<T: NativeObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether the dynamic type is `id` or derives from it
    pub fn is_a(&self, id: NativeTypeId) -> bool {
        self.type_info().is_a(id)
    }
}

impl fmt::Debug for dyn NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}>", self.type_info().name())
    }
}

/// Implements the `as_any`/`into_any` boilerplate of `NativeObject`.
#[macro_export]
macro_rules! native_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
            self
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    static BASE: NativeTypeInfo = NativeTypeInfo::root("Base");
    static MIDDLE: NativeTypeInfo = NativeTypeInfo::derived("Middle", &BASE);
    static LEAF: NativeTypeInfo = NativeTypeInfo::derived("Leaf", &MIDDLE);

    struct Leaf;

    impl NativeObject for Leaf {
        fn type_info(&self) -> &'static NativeTypeInfo {
            &LEAF
        }

        native_any!();
    }

    #[test]
    fn test_ancestry_most_derived_first() {
        let names: Vec<_> = LEAF.ancestry().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Leaf", "Middle", "Base"]);
    }

    #[test]
    fn test_is_a() {
        assert!(LEAF.is_a(BASE.id()));
        assert!(LEAF.is_a(LEAF.id()));
        assert!(!BASE.is_a(LEAF.id()));
    }

    #[test]
    fn test_downcast() {
        let obj: Box<dyn NativeObject> = Box::new(Leaf);
        assert!(obj.downcast_ref::<Leaf>().is_some());
        assert!(obj.is_a(MIDDLE.id()));
        assert_eq!(format!("{:?}", obj), "<native Leaf>");
    }
}
