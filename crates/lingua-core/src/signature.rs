//! Parameter descriptors and argument converters
//!
//! A `Param` is the declared native type of one parameter. Conversion of a
//! host value either succeeds with an `Arg` or rejects the value; a
//! rejection makes the resolver move on to the next call signature.
//! Conversions are strict: floats never narrow to integers, booleans are
//! not integers and integers never narrow to a smaller width.

use std::fmt;

use lingua_sdk::HostValue;

use crate::wrapper::as_wrapper;

/// Declared native parameter type
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// 32-bit integer; host ints in range only
    Int32,
    /// 64-bit integer
    Int64,
    /// Double; host floats and ints
    Double,
    /// Boolean
    Bool,
    /// Host string only
    Str,
    /// Host string or any wrapped native object with text content
    Text,
    /// Wrapped instance of the named host class or a subclass, borrowed
    /// for the call (the native side copies it if it keeps it)
    Object(&'static str),
    /// Wrapped instance of either named host class
    Either(&'static str, &'static str),
    /// Wrapped instance of the named class whose ownership passes to the
    /// native callee
    Adopt(&'static str),
    /// Any host object (upcall targets)
    Host,
    /// The inner parameter, or the absent value
    Optional(Box<Param>),
    /// Any value, passed through
    Any,
}

impl Param {
    /// Optional variant of `param`
    pub fn optional(param: Param) -> Self {
        Param::Optional(Box::new(param))
    }

    /// Convert one host value, or reject it
    pub fn convert(&self, value: &HostValue) -> Option<Arg> {
        match self {
            Param::Int32 => match value {
                HostValue::Int(i) => i32::try_from(*i).ok().map(Arg::Int32),
                _ => None,
            },
            Param::Int64 => value.as_int().map(Arg::Int64),
            Param::Double => match value {
                HostValue::Float(f) => Some(Arg::Double(*f)),
                HostValue::Int(i) => Some(Arg::Double(*i as f64)),
                _ => None,
            },
            Param::Bool => value.as_bool().map(Arg::Bool),
            Param::Str => value.as_str().map(|s| Arg::Text(s.to_string())),
            Param::Text => match value {
                HostValue::Str(s) => Some(Arg::Text(s.to_string())),
                _ => as_wrapper(value)
                    .and_then(|w| w.handle().get())
                    .and_then(|native| native.as_text())
                    .map(Arg::Text),
            },
            Param::Object(class) => {
                instance_of(value, &[*class]).then(|| Arg::Object(value.clone()))
            }
            Param::Either(a, b) => instance_of(value, &[*a, *b]).then(|| Arg::Object(value.clone())),
            Param::Adopt(class) => instance_of(value, &[*class]).then(|| Arg::Adopt(value.clone())),
            Param::Host => value.as_object().map(|_| Arg::Host(value.clone())),
            Param::Optional(inner) => {
                if value.is_none() {
                    Some(Arg::None)
                } else {
                    inner.convert(value)
                }
            }
            Param::Any => Some(Arg::Host(value.clone())),
        }
    }
}

fn instance_of(value: &HostValue, classes: &[&str]) -> bool {
    as_wrapper(value).map_or(false, |wrapper| {
        classes.iter().any(|class| wrapper.is_instance(class))
    })
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Int32 => f.write_str("int32"),
            Param::Int64 => f.write_str("int64"),
            Param::Double => f.write_str("double"),
            Param::Bool => f.write_str("bool"),
            Param::Str => f.write_str("str"),
            Param::Text => f.write_str("text"),
            Param::Object(class) => f.write_str(class),
            Param::Either(a, b) => write!(f, "{}|{}", a, b),
            Param::Adopt(class) => write!(f, "adopt {}", class),
            Param::Host => f.write_str("object"),
            Param::Optional(inner) => write!(f, "{}?", inner),
            Param::Any => f.write_str("any"),
        }
    }
}

/// A converted argument.
///
/// Text arguments are owned by the call frame and dropped after the call.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Absent optional value
    None,
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// Double
    Double(f64),
    /// Boolean
    Bool(bool),
    /// Transient text copy
    Text(String),
    /// Borrowed wrapped object
    Object(HostValue),
    /// Wrapped object to be adopted once the signature is selected
    Adopt(HostValue),
    /// Host value passed through
    Host(HostValue),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int32_rejects_floats_bools_and_wide_values() {
        assert!(matches!(Param::Int32.convert(&HostValue::Int(7)), Some(Arg::Int32(7))));
        assert!(Param::Int32.convert(&HostValue::Float(7.0)).is_none());
        assert!(Param::Int32.convert(&HostValue::Bool(true)).is_none());
        assert!(Param::Int32.convert(&HostValue::Int(1 << 40)).is_none());
        assert!(matches!(
            Param::Int64.convert(&HostValue::Int(1 << 40)),
            Some(Arg::Int64(v)) if v == 1 << 40
        ));
    }

    #[test]
    fn test_double_widens_ints() {
        assert!(matches!(Param::Double.convert(&HostValue::Int(2)), Some(Arg::Double(v)) if v == 2.0));
        assert!(Param::Double.convert(&HostValue::str("2")).is_none());
    }

    #[test]
    fn test_text_and_str() {
        assert!(matches!(Param::Str.convert(&HostValue::str("abc")), Some(Arg::Text(ref s)) if s == "abc"));
        assert!(Param::Str.convert(&HostValue::Int(1)).is_none());
        assert!(Param::Text.convert(&HostValue::str("abc")).is_some());
    }

    #[test]
    fn test_optional() {
        let param = Param::optional(Param::Int32);
        assert!(matches!(param.convert(&HostValue::None), Some(Arg::None)));
        assert!(matches!(param.convert(&HostValue::Int(3)), Some(Arg::Int32(3))));
        assert_eq!(param.to_string(), "int32?");
    }

    #[test]
    fn test_object_requires_wrapper() {
        assert!(Param::Object("Locale").convert(&HostValue::str("en")).is_none());
        assert!(Param::Host.convert(&HostValue::Int(1)).is_none());
    }
}
