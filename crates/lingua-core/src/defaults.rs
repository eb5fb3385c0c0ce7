//! Bridge configuration and process-wide default objects.
//!
//! Centralizes the numeric defaults and the `BridgeOptions` knobs, plus the
//! `Singleton` slot used for native process defaults (default time zone and
//! the like) that several handles may observe at once.

use std::sync::Arc;

use lingua_sdk::BridgeError;
use parking_lot::RwLock;

/// Default maximum nesting of upcalls (upcall inside upcall).
pub const DEFAULT_MAX_UPCALL_DEPTH: usize = 64;

/// Environment variable selecting the ownership policy (`abort` or `leak`).
pub const ENV_OWNERSHIP_POLICY: &str = "LINGUA_OWNERSHIP_POLICY";

/// Environment variable overriding the maximum upcall depth.
pub const ENV_MAX_UPCALL_DEPTH: &str = "LINGUA_MAX_UPCALL_DEPTH";

/// What to do when a handle ownership invariant is found broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipPolicy {
    /// Panic. Default in debug builds.
    Abort,
    /// Log, leave the native object untouched and return
    /// `BridgeError::OwnershipViolation`. Default in release builds.
    Leak,
}

impl Default for OwnershipPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            OwnershipPolicy::Abort
        } else {
            OwnershipPolicy::Leak
        }
    }
}

impl OwnershipPolicy {
    /// Parse `abort` / `leak` (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Some(OwnershipPolicy::Abort),
            "leak" => Some(OwnershipPolicy::Leak),
            _ => None,
        }
    }

    /// Report a violation according to the policy.
    pub(crate) fn violation(self, msg: String) -> BridgeError {
        match self {
            OwnershipPolicy::Abort => panic!("ownership violation: {}", msg),
            OwnershipPolicy::Leak => {
                log::error!("ownership violation (object leaked): {}", msg);
                BridgeError::OwnershipViolation(msg)
            }
        }
    }
}

/// Options for a bridge instance
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Handling of ownership violations
    pub ownership_policy: OwnershipPolicy,
    /// Maximum upcall nesting per thread
    pub max_upcall_depth: usize,
    /// Keep the last upcall failure on each proxy
    pub record_upcall_errors: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            ownership_policy: OwnershipPolicy::default(),
            max_upcall_depth: DEFAULT_MAX_UPCALL_DEPTH,
            record_upcall_errors: true,
        }
    }
}

impl BridgeOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Default options overridden by `LINGUA_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(value) = std::env::var(ENV_OWNERSHIP_POLICY) {
            match OwnershipPolicy::parse(&value) {
                Some(policy) => options.ownership_policy = policy,
                None => log::warn!("ignoring {}={:?}", ENV_OWNERSHIP_POLICY, value),
            }
        }
        if let Ok(value) = std::env::var(ENV_MAX_UPCALL_DEPTH) {
            match value.trim().parse::<usize>() {
                Ok(depth) => options.max_upcall_depth = depth,
                Err(_) => log::warn!("ignoring {}={:?}", ENV_MAX_UPCALL_DEPTH, value),
            }
        }
        options
    }

    /// Set the ownership policy
    pub fn with_ownership_policy(mut self, policy: OwnershipPolicy) -> Self {
        self.ownership_policy = policy;
        self
    }

    /// Set the maximum upcall depth
    pub fn with_max_upcall_depth(mut self, depth: usize) -> Self {
        self.max_upcall_depth = depth;
        self
    }

    /// Enable or disable recording of upcall failures
    pub fn with_record_upcall_errors(mut self, record: bool) -> Self {
        self.record_upcall_errors = record;
        self
    }
}

/// Process-wide default object with atomic get/swap.
///
/// Readers get an `Arc` snapshot; a swap never invalidates snapshots that
/// are still held.
pub struct Singleton<T: ?Sized> {
    slot: RwLock<Arc<T>>,
}

impl<T> Singleton<T> {
    /// Create a slot holding `value`
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }
}

impl<T: ?Sized> Singleton<T> {
    /// Create a slot holding a shared value
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            slot: RwLock::new(value),
        }
    }

    /// Current value
    pub fn get(&self) -> Arc<T> {
        self.slot.read().clone()
    }

    /// Replace the value, returning the previous one
    pub fn swap(&self, value: Arc<T>) -> Arc<T> {
        std::mem::replace(&mut *self.slot.write(), value)
    }

    /// Replace the value
    pub fn set(&self, value: Arc<T>) {
        self.swap(value);
    }
}
