//! Overload resolution
//!
//! A native method is an ordered list of `CallSignature`s. A call tries the
//! signatures whose arity matches, in declaration order, and runs the first
//! one whose parameters all convert. Order is significant: bindings list
//! the most specific shape first. No scoring, no best match.

use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use lingua_sdk::{BridgeError, BridgeResult, HostValue, StatusCode};

use crate::handle::Handle;
use crate::module::Bridge;
use crate::native::NativeObject;
use crate::signature::{Arg, Param};
use crate::translate::{translate, ErrorEnvelope, Outcome};
use crate::types::HostClass;
use crate::wrapper::{as_wrapper, Wrapper};

/// Native invocation thunk of one signature
pub type Thunk = Arc<dyn Fn(&CallFrame<'_>) -> BridgeResult<HostValue> + Send + Sync>;

/// One overload of a native method
#[derive(Clone)]
pub struct CallSignature {
    params: Vec<Param>,
    thunk: Thunk,
}

impl CallSignature {
    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Declared parameters
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Convert every argument, or reject the signature
    pub fn convert(&self, args: &[HostValue]) -> Option<Vec<Arg>> {
        if args.len() != self.params.len() {
            return None;
        }
        self.params
            .iter()
            .zip(args)
            .map(|(param, arg)| param.convert(arg))
            .collect()
    }
}

impl fmt::Debug for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "({})", params.join(", "))
    }
}

/// Ordered overload list of a native method
#[derive(Clone)]
pub struct Method {
    name: String,
    signatures: Vec<CallSignature>,
}

impl Method {
    /// Start building a method; `name` is the qualified `Class.method` name
    pub fn builder(name: impl Into<String>) -> MethodBuilder {
        MethodBuilder {
            name: name.into(),
            signatures: Vec::new(),
        }
    }

    /// Qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overloads, in precedence order
    pub fn signatures(&self) -> &[CallSignature] {
        &self.signatures
    }

    /// Find the first signature accepting `args`
    pub fn resolve(&self, args: &[HostValue]) -> Option<(&CallSignature, Vec<Arg>)> {
        self.signatures
            .iter()
            .find_map(|sig| sig.convert(args).map(|converted| (sig, converted)))
    }

    /// Resolve and run the call.
    ///
    /// `class` is the class of the receiver, or the class being constructed
    /// when `this` is `None`.
    pub fn invoke(
        &self,
        bridge: &Bridge,
        class: &Arc<HostClass>,
        this: Option<&HostValue>,
        args: &[HostValue],
    ) -> BridgeResult<HostValue> {
        let (signature, converted) = self.resolve(args).ok_or_else(|| BridgeError::InvalidArgument {
            method: self.name.clone(),
            args: args.iter().map(|a| a.type_name().to_string()).collect(),
        })?;

        let frame = CallFrame {
            bridge,
            class,
            method: &self.name,
            this,
            raw: args,
            args: converted,
        };
        (signature.thunk)(&frame)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("signatures", &self.signatures)
            .finish()
    }
}

/// Builder for `Method`
pub struct MethodBuilder {
    name: String,
    signatures: Vec<CallSignature>,
}

impl MethodBuilder {
    /// Append an overload
    pub fn sig<F>(mut self, params: impl Into<Vec<Param>>, thunk: F) -> Self
    where
        F: Fn(&CallFrame<'_>) -> BridgeResult<HostValue> + Send + Sync + 'static,
    {
        self.signatures.push(CallSignature {
            params: params.into(),
            thunk: Arc::new(thunk),
        });
        self
    }

    /// Append a zero-argument overload
    pub fn no_args<F>(self, thunk: F) -> Self
    where
        F: Fn(&CallFrame<'_>) -> BridgeResult<HostValue> + Send + Sync + 'static,
    {
        self.sig(Vec::<Param>::new(), thunk)
    }

    /// Finish the method
    pub fn build(self) -> Method {
        Method {
            name: self.name,
            signatures: self.signatures,
        }
    }
}

/// Everything a thunk sees of the call in progress
pub struct CallFrame<'a> {
    bridge: &'a Bridge,
    class: &'a Arc<HostClass>,
    method: &'a str,
    this: Option<&'a HostValue>,
    raw: &'a [HostValue],
    args: Vec<Arg>,
}

impl<'a> CallFrame<'a> {
    /// The bridge context
    pub fn bridge(&self) -> &'a Bridge {
        self.bridge
    }

    /// Class of the receiver (or of the object under construction)
    pub fn class(&self) -> &'a Arc<HostClass> {
        self.class
    }

    /// Qualified method name
    pub fn method(&self) -> &'a str {
        self.method
    }

    fn mismatch(&self, index: usize, expected: &str) -> BridgeError {
        BridgeError::TypeMismatch {
            expected: format!("{} argument {} of {}", expected, index, self.method),
            got: self.raw.get(index).map_or("nothing", |v| v.type_name()).to_string(),
        }
    }

    /// The receiver as passed by the host
    pub fn this_value(&self) -> BridgeResult<&'a HostValue> {
        self.this.ok_or_else(|| BridgeError::TypeMismatch {
            expected: format!("receiver of {}", self.method),
            got: "nothing".to_string(),
        })
    }

    /// The receiver's wrapper
    pub fn this_wrapper(&self) -> BridgeResult<&'a Wrapper> {
        let this = self.this_value()?;
        as_wrapper(this).ok_or_else(|| BridgeError::TypeMismatch {
            expected: format!("receiver of {}", self.method),
            got: this.type_name().to_string(),
        })
    }

    /// The receiver's native object, downcast
    pub fn this<T: NativeObject>(&self) -> BridgeResult<&'a T> {
        self.this_wrapper()?.downcast::<T>(self.bridge.options().ownership_policy)
    }

    /// Raw host argument, for returning it unchanged
    pub fn arg(&self, index: usize) -> BridgeResult<&'a HostValue> {
        self.raw.get(index).ok_or_else(|| self.mismatch(index, "value"))
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether the call has no arguments
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Whether an optional argument was absent
    pub fn is_none(&self, index: usize) -> bool {
        matches!(self.args.get(index), Some(Arg::None))
    }

    /// 32-bit integer argument
    pub fn i32(&self, index: usize) -> BridgeResult<i32> {
        match self.args.get(index) {
            Some(Arg::Int32(v)) => Ok(*v),
            _ => Err(self.mismatch(index, "int32")),
        }
    }

    /// 64-bit integer argument
    pub fn i64(&self, index: usize) -> BridgeResult<i64> {
        match self.args.get(index) {
            Some(Arg::Int64(v)) => Ok(*v),
            Some(Arg::Int32(v)) => Ok(*v as i64),
            _ => Err(self.mismatch(index, "int64")),
        }
    }

    /// Double argument
    pub fn f64(&self, index: usize) -> BridgeResult<f64> {
        match self.args.get(index) {
            Some(Arg::Double(v)) => Ok(*v),
            _ => Err(self.mismatch(index, "double")),
        }
    }

    /// Boolean argument
    pub fn bool(&self, index: usize) -> BridgeResult<bool> {
        match self.args.get(index) {
            Some(Arg::Bool(v)) => Ok(*v),
            _ => Err(self.mismatch(index, "bool")),
        }
    }

    /// Text argument (a transient copy owned by the frame)
    pub fn str(&self, index: usize) -> BridgeResult<&str> {
        match self.args.get(index) {
            Some(Arg::Text(s)) => Ok(s),
            _ => Err(self.mismatch(index, "text")),
        }
    }

    /// Host object argument
    pub fn host(&self, index: usize) -> BridgeResult<&HostValue> {
        match self.args.get(index) {
            Some(Arg::Host(v)) | Some(Arg::Object(v)) | Some(Arg::Adopt(v)) => Ok(v),
            _ => Err(self.mismatch(index, "object")),
        }
    }

    /// Wrapped object argument
    pub fn wrapper(&self, index: usize) -> BridgeResult<&Wrapper> {
        match self.args.get(index) {
            Some(Arg::Object(v)) | Some(Arg::Adopt(v)) => as_wrapper(v).ok_or_else(|| self.mismatch(index, "wrapper")),
            _ => Err(self.mismatch(index, "wrapper")),
        }
    }

    /// Borrow the native object of a wrapped argument
    pub fn native<T: NativeObject>(&self, index: usize) -> BridgeResult<&T> {
        self.wrapper(index)?
            .downcast::<T>(self.bridge.options().ownership_policy)
    }

    /// Take ownership of an `Adopt` argument away from its host wrapper.
    ///
    /// The wrapper is left detached; the returned object belongs to the
    /// native callee.
    pub fn adopt(&self, index: usize) -> BridgeResult<Box<dyn NativeObject>> {
        match self.args.get(index) {
            Some(Arg::Adopt(v)) => {
                let wrapper = as_wrapper(v).ok_or_else(|| self.mismatch(index, "wrapper"))?;
                wrapper.handle().disown(self.bridge.options().ownership_policy)
            }
            _ => Err(self.mismatch(index, "adoptable wrapper")),
        }
    }

    /// Like [`CallFrame::adopt`], downcast to the concrete class
    pub fn adopt_as<T: NativeObject>(&self, index: usize) -> BridgeResult<Box<T>> {
        let adopted = self.adopt(index)?;
        let got = adopted.type_info().name();
        adopted
            .into_any()
            .downcast::<T>()
            .map_err(|_| BridgeError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                got: got.to_string(),
            })
    }

    /// Wrap a new native object, most-derived class below `declared`
    pub fn wrap(&self, obj: Box<dyn NativeObject>, declared: &str) -> BridgeResult<HostValue> {
        self.bridge.wrap_owned(obj, declared)
    }

    /// Wrap an optional native result; `None` becomes the absent value
    pub fn wrap_opt(&self, obj: Option<Box<dyn NativeObject>>, declared: &str) -> BridgeResult<HostValue> {
        match obj {
            Some(obj) => self.wrap(obj, declared),
            None => Ok(HostValue::None),
        }
    }

    /// Wrap an object owned by the receiver.
    ///
    /// The returned wrapper keeps the receiver alive.
    ///
    /// # Safety
    /// `ptr` must stay valid for as long as the receiver lives and must not
    /// be released by it before then.
    pub unsafe fn wrap_member(&self, ptr: NonNull<dyn NativeObject>, declared: &str) -> BridgeResult<HostValue> {
        let owner = self.this_value()?.clone();
        self.bridge.wrap_borrowed(ptr, declared, Some(owner))
    }

    /// Wrap a new native object as an instance of the frame's class
    pub fn instance(&self, obj: Box<dyn NativeObject>) -> BridgeResult<HostValue> {
        Ok(HostValue::object(Wrapper::new(
            Arc::clone(self.class),
            Handle::owned(obj),
        )))
    }

    /// Translate a native status; warnings are returned to the thunk
    pub fn check(&self, envelope: impl Into<ErrorEnvelope>) -> BridgeResult<Outcome> {
        translate(envelope.into())
    }

    /// Fail on a failure status
    pub fn check_status(&self, status: StatusCode) -> BridgeResult<()> {
        self.check(status).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Method {
        Method::builder("Grid.pick")
            .sig([Param::Str], |_| Ok(HostValue::str("A")))
            .sig([Param::Int32], |_| Ok(HostValue::str("B")))
            .sig([Param::Int32, Param::Int32], |_| Ok(HostValue::str("C")))
            .build()
    }

    fn picked(method: &Method, args: &[HostValue]) -> Option<usize> {
        let (sig, _) = method.resolve(args)?;
        method
            .signatures()
            .iter()
            .position(|s| std::ptr::eq(s, sig))
    }

    #[test]
    fn test_first_match_by_arity_and_type() {
        let method = grid();
        assert_eq!(picked(&method, &[HostValue::str("x")]), Some(0));
        assert_eq!(picked(&method, &[HostValue::Int(1)]), Some(1));
        assert_eq!(picked(&method, &[HostValue::Int(1), HostValue::Int(2)]), Some(2));
        assert_eq!(picked(&method, &[HostValue::Float(1.5)]), None);
        assert_eq!(picked(&method, &[]), None);
    }

    #[test]
    fn test_order_is_precedence() {
        let method = Method::builder("Order.run")
            .sig([Param::Double], |_| Ok(HostValue::Int(1)))
            .sig([Param::Int32], |_| Ok(HostValue::Int(2)))
            .build();
        assert_eq!(picked(&method, &[HostValue::Int(3)]), Some(0));
    }

    #[test]
    fn test_integer_width() {
        let method = Method::builder("Width.set")
            .sig([Param::Int32], |_| Ok(HostValue::Int(32)))
            .sig([Param::Int64], |_| Ok(HostValue::Int(64)))
            .build();
        assert_eq!(picked(&method, &[HostValue::Int(5)]), Some(0));
        assert_eq!(picked(&method, &[HostValue::Int(i64::from(i32::MAX) + 1)]), Some(1));
        assert_eq!(picked(&method, &[HostValue::Int(i64::MIN)]), Some(1));
    }

    #[test]
    fn test_debug_lists_signatures() {
        let text = format!("{:?}", grid());
        assert!(text.contains("(str)"));
        assert!(text.contains("(int32, int32)"));
    }
}
