//! Lingua SDK - host-side types shared by the bridge engine and bindings
//!
//! This crate provides the minimal types needed on both sides of the
//! bridge without depending on the engine:
//! - `HostValue` / `HostObject`: the dynamically-typed host value model
//! - `StatusCode` / `StatusCategory`: the native status taxonomy
//! - `BridgeError` / `ParseError`: host-visible failures
//! - `FromHost` / `ToHost`: value conversion traits
//!
//! # Example
//!
//! ```ignore
//! use lingua_sdk::{FromHost, HostValue};
//!
//! let v = HostValue::from(42);
//! assert_eq!(i32::from_host(&v)?, 42);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod convert;
pub mod error;
pub mod status;
pub mod value;

pub use convert::{FromHost, ToHost};
pub use error::{BridgeError, BridgeResult, ParseError};
pub use status::{StatusCategory, StatusCode};
pub use value::{HostObject, HostValue, ObjectRef};
