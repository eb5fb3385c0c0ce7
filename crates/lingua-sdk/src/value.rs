//! HostValue — the dynamically-typed value model of the host runtime
//!
//! Every value crossing the bridge from the host side is a `HostValue`.
//! Primitives are stored inline; strings, lists and objects are shared
//! through `Arc`, so cloning a `HostValue` clones a reference, never the
//! underlying object. Identity (`HostValue::is`) is therefore pointer
//! identity for heap values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};

/// A host-language object.
///
/// Wrappers around native objects implement this trait inside the engine;
/// host code implements it for its own classes, including classes that
/// extend abstract native interfaces through upcall proxies.
pub trait HostObject: Any + Send + Sync {
    /// Host-visible class name (used in diagnostics)
    fn type_name(&self) -> &str;

    /// Invoke a host method by name.
    ///
    /// The default implementation reports the method as missing.
    fn call_method(&self, name: &str, _args: &[HostValue]) -> BridgeResult<HostValue> {
        Err(BridgeError::NoSuchMethod {
            class: self.type_name().to_string(),
            method: name.to_string(),
        })
    }

    /// Whether `call_method` understands `name`
    fn has_method(&self, _name: &str) -> bool {
        false
    }

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;
}

/// Shared reference to a host object
pub type ObjectRef = Arc<dyn HostObject>;

/// A host value.
#[derive(Clone)]
pub enum HostValue {
    /// The absent value (`None` in the host)
    None,
    /// Boolean
    Bool(bool),
    /// Host integer
    Int(i64),
    /// Host float
    Float(f64),
    /// Immutable host string
    Str(Arc<str>),
    /// Immutable host list
    List(Arc<[HostValue]>),
    /// Any host object, including wrapped native objects
    Object(ObjectRef),
}

impl HostValue {
    /// Create a string value
    pub fn str(s: impl AsRef<str>) -> Self {
        HostValue::Str(Arc::from(s.as_ref()))
    }

    /// Create a list value
    pub fn list(items: impl Into<Vec<HostValue>>) -> Self {
        HostValue::List(Arc::from(items.into()))
    }

    /// Wrap a host object
    pub fn object<T: HostObject>(obj: T) -> Self {
        HostValue::Object(Arc::new(obj))
    }

    /// Host type name, as the host would report it
    pub fn type_name(&self) -> &str {
        match self {
            HostValue::None => "NoneType",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::List(_) => "list",
            HostValue::Object(obj) => obj.type_name(),
        }
    }

    /// Check for the absent value
    pub fn is_none(&self) -> bool {
        matches!(self, HostValue::None)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            HostValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float (integers are not widened here)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            HostValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get list items
    pub fn as_list(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the object reference
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Downcast an object value to its concrete host type
    pub fn downcast_ref<T: HostObject>(&self) -> Option<&T> {
        self.as_object()?.as_any().downcast_ref::<T>()
    }

    /// Host identity (`is` in the host language).
    ///
    /// Heap values compare by address, primitives by value.
    pub fn is(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::None, HostValue::None) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a.to_bits() == b.to_bits(),
            (HostValue::Str(a), HostValue::Str(b)) => Arc::ptr_eq(a, b),
            (HostValue::List(a), HostValue::List(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            (HostValue::Object(a), HostValue::Object(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl Default for HostValue {
    fn default() -> Self {
        HostValue::None
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::None => write!(f, "None"),
            HostValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            HostValue::Int(i) => write!(f, "{}", i),
            HostValue::Float(x) => write!(f, "{:?}", x),
            HostValue::Str(s) => write!(f, "{:?}", s),
            HostValue::List(items) => f.debug_list().entries(items.iter()).finish(),
            HostValue::Object(obj) => write!(f, "<{} object>", obj.type_name()),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i32> for HostValue {
    fn from(i: i32) -> Self {
        HostValue::Int(i as i64)
    }
}

impl From<i64> for HostValue {
    fn from(i: i64) -> Self {
        HostValue::Int(i)
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::str(s)
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(Arc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point;

    impl HostObject for Point {
        fn type_name(&self) -> &str {
            "Point"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!(HostValue::None.type_name(), "NoneType");
        assert_eq!(HostValue::from(1).type_name(), "int");
        assert_eq!(HostValue::from(1.5).type_name(), "float");
        assert_eq!(HostValue::from("x").type_name(), "str");
        assert_eq!(HostValue::object(Point).type_name(), "Point");
    }

    #[test]
    fn test_identity() {
        let a = HostValue::str("abc");
        let b = a.clone();
        let c = HostValue::str("abc");
        assert!(a.is(&b));
        assert!(!a.is(&c));

        let p = HostValue::object(Point);
        assert!(p.is(&p.clone()));
        assert!(!p.is(&HostValue::object(Point)));
    }

    #[test]
    fn test_downcast() {
        let p = HostValue::object(Point);
        assert!(p.downcast_ref::<Point>().is_some());
        assert!(HostValue::from(3).downcast_ref::<Point>().is_none());
    }

    #[test]
    fn test_default_call_method_is_missing() {
        let p = Point;
        let err = p.call_method("area", &[]).unwrap_err();
        assert!(matches!(err, BridgeError::NoSuchMethod { .. }));
    }
}
