//! Lingua ICU - internationalization class families over the lingua engine
//!
//! This crate contains:
//! - `native`: a stand-in native class library (locales, strings, number
//!   formats, time zones, filters and transliterators)
//! - `bindings`: the host classes, call signatures and constants exposing
//!   that library through a `lingua_core::Bridge`
//!
//! # Example
//!
//! ```ignore
//! let bridge = lingua_icu::init_module(&env)?;
//! let format = bridge.construct("DecimalFormat", &[HostValue::str("#,##0.00")])?;
//! let text = bridge.call_method(&format, "format", &[HostValue::Float(1234.5)])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bindings;
pub mod native;

pub use bindings::{init_module, init_module_with, MODULE_NAME};
