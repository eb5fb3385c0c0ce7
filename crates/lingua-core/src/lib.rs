//! Lingua binding engine
//!
//! This crate provides the machinery that exposes a polymorphic native
//! class library to a dynamically-typed host:
//! - Handles owning or borrowing native objects
//! - Type registry resolving the most-derived host class of a native object
//! - First-match overload resolution and argument conversion
//! - Translation of native status codes and parse records
//! - Upcall proxies forwarding native virtual calls to host objects

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod defaults;
pub mod handle;
pub mod module;
pub mod native;
pub mod resolver;
pub mod signature;
pub mod translate;
pub mod types;
pub mod upcall;
pub mod wrapper;

pub use defaults::{BridgeOptions, OwnershipPolicy, Singleton};
pub use handle::{Handle, Ownership};
pub use module::{Bridge, Constant, HostEnvironment, ModuleBuilder};
pub use native::{NativeObject, NativeTypeId, NativeTypeInfo};
pub use resolver::{CallFrame, CallSignature, Method, MethodBuilder};
pub use signature::{Arg, Param};
pub use translate::{translate, ErrorEnvelope, ExceptionClass, ExceptionClasses, HostException, Outcome, WarningResult};
pub use types::{ClassBuilder, HostClass, TypeRegistry, TypeRegistryBuilder};
pub use upcall::{ProxyState, UpcallProxy, WeakUpcall};
pub use wrapper::{as_wrapper, Wrapper};

pub use lingua_sdk::{BridgeError, BridgeResult, HostObject, HostValue, ParseError, StatusCode};
