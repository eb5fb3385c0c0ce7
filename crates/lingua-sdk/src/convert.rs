//! Conversion traits between host values and Rust types.
//!
//! `FromHost` is used wherever a host value comes back across the bridge
//! (upcall results); `ToHost` is used for native results returned to the
//! host. Conversions are strict: no float truncation, no silent narrowing
//! of integers.

use crate::error::{BridgeError, BridgeResult};
use crate::value::HostValue;

/// Convert a host value into a Rust type.
pub trait FromHost: Sized {
    /// Convert, returning a type mismatch if the value doesn't fit.
    fn from_host(value: &HostValue) -> BridgeResult<Self>;
}

/// Convert a Rust type into a host value.
pub trait ToHost {
    /// Convert into a host value.
    fn to_host(self) -> HostValue;
}

fn mismatch(expected: &str, value: &HostValue) -> BridgeError {
    BridgeError::TypeMismatch {
        expected: expected.to_string(),
        got: value.type_name().to_string(),
    }
}

impl FromHost for i32 {
    fn from_host(value: &HostValue) -> BridgeResult<Self> {
        value
            .as_int()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| mismatch("int (32-bit)", value))
    }
}

impl FromHost for i64 {
    fn from_host(value: &HostValue) -> BridgeResult<Self> {
        value.as_int().ok_or_else(|| mismatch("int", value))
    }
}

impl FromHost for f64 {
    fn from_host(value: &HostValue) -> BridgeResult<Self> {
        match value {
            HostValue::Float(f) => Ok(*f),
            HostValue::Int(i) => Ok(*i as f64),
            _ => Err(mismatch("float", value)),
        }
    }
}

impl FromHost for bool {
    fn from_host(value: &HostValue) -> BridgeResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromHost for String {
    fn from_host(value: &HostValue) -> BridgeResult<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("str", value))
    }
}

impl FromHost for () {
    fn from_host(_value: &HostValue) -> BridgeResult<Self> {
        Ok(())
    }
}

impl FromHost for HostValue {
    fn from_host(value: &HostValue) -> BridgeResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromHost> FromHost for Option<T> {
    fn from_host(value: &HostValue) -> BridgeResult<Self> {
        if value.is_none() {
            Ok(None)
        } else {
            T::from_host(value).map(Some)
        }
    }
}

impl ToHost for i32 {
    fn to_host(self) -> HostValue {
        HostValue::Int(self as i64)
    }
}

impl ToHost for i64 {
    fn to_host(self) -> HostValue {
        HostValue::Int(self)
    }
}

impl ToHost for f64 {
    fn to_host(self) -> HostValue {
        HostValue::Float(self)
    }
}

impl ToHost for bool {
    fn to_host(self) -> HostValue {
        HostValue::Bool(self)
    }
}

impl ToHost for String {
    fn to_host(self) -> HostValue {
        HostValue::from(self)
    }
}

impl ToHost for &str {
    fn to_host(self) -> HostValue {
        HostValue::str(self)
    }
}

impl ToHost for () {
    fn to_host(self) -> HostValue {
        HostValue::None
    }
}

impl ToHost for HostValue {
    fn to_host(self) -> HostValue {
        self
    }
}

impl<T: ToHost> ToHost for Option<T> {
    fn to_host(self) -> HostValue {
        match self {
            Some(v) => v.to_host(),
            None => HostValue::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_rejects_out_of_range() {
        assert_eq!(i32::from_host(&HostValue::Int(7)).unwrap(), 7);
        assert!(i32::from_host(&HostValue::Int(1 << 40)).is_err());
        assert!(i32::from_host(&HostValue::Float(1.0)).is_err());
    }

    #[test]
    fn test_f64_widens_ints() {
        assert_eq!(f64::from_host(&HostValue::Int(2)).unwrap(), 2.0);
        assert!(f64::from_host(&HostValue::str("2")).is_err());
    }

    #[test]
    fn test_option_accepts_none() {
        assert_eq!(Option::<bool>::from_host(&HostValue::None).unwrap(), None);
        assert_eq!(Option::<bool>::from_host(&HostValue::Bool(true)).unwrap(), Some(true));
    }

    #[test]
    fn test_to_host() {
        assert_eq!(42i32.to_host().as_int(), Some(42));
        assert!(().to_host().is_none());
        assert_eq!("x".to_host().as_str(), Some("x"));
    }
}
