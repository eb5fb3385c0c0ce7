//! Stand-in native class library
//!
//! A small polymorphic object library with the shape of an ICU-style
//! toolkit: RTTI chains, polymorphic `clone`, native equality, status codes
//! with parse records, abstract classes with virtual methods and process
//! defaults. Its algorithms are deliberately simple; what matters is how the
//! bindings move these objects across the bridge.
//!
//! Every object embeds an [`alloc::Tracked`] marker so tests can check that
//! each native object is released exactly once.

use lingua_core::ErrorEnvelope;

pub mod alloc;
pub mod format;
pub mod locale;
pub mod timezone;
pub mod translit;
pub mod unistr;

pub use alloc::{alloc_stats, AllocStats, Tracked};
pub use format::{Number, NumberFormat, NumberStyle, ParseOutcome, Pattern};
pub use locale::{Locale, Symbols};
pub use timezone::TimeZone;
pub use translit::{into_filter, Direction, Filter, HostFilter, Transliterator, UnicodeSet};
pub use unistr::UnicodeString;

/// Result of a native call that can fail with a status
pub type NativeResult<T> = Result<T, ErrorEnvelope>;
