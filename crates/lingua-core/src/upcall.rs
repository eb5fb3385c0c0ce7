//! Upcall proxies
//!
//! An `UpcallProxy` lives inside a native object that implements an abstract
//! native interface on behalf of a host object. Native virtual calls land in
//! the proxy, which invokes the host method of the same name.
//!
//! ## Ownership
//!
//! The proxy holds the only owning edge: proxy → host object. Host code that
//! needs to recognize its proxy keeps a `WeakUpcall`, which never keeps the
//! proxy alive. Clones made by native code share the same core, hence the
//! same host object and the same last-error slot.
//!
//! ## Failures
//!
//! Nothing unwinds into native code. A missing method, a host error, a
//! result of the wrong type, a panic or an exceeded re-entrancy depth make
//! the upcall return the caller-supplied default; the failure is logged and
//! kept on the proxy until host code takes it.

use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use lingua_sdk::{BridgeError, BridgeResult, FromHost, HostValue};
use parking_lot::Mutex;

use crate::module::Bridge;
use crate::native::NativeObject;

/// Lifecycle of a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Constructed, host reference held, not yet used by a native consumer
    Unattached,
    /// Registered with a native consumer; may receive calls at any time
    Active,
    /// Dropped by every native owner; the host reference is gone
    Released,
}

const UNATTACHED: u8 = 0;
const ACTIVE: u8 = 1;

thread_local! {
    static UPCALL_DEPTH: Cell<usize> = Cell::new(0);
}

/// Per-thread upcall nesting guard
struct DepthGuard;

impl DepthGuard {
    fn enter(method: &str, limit: usize) -> BridgeResult<Self> {
        UPCALL_DEPTH.with(|depth| {
            if depth.get() >= limit {
                return Err(BridgeError::UpcallDepthExceeded {
                    method: method.to_string(),
                    limit,
                });
            }
            depth.set(depth.get() + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        UPCALL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

struct ProxyCore {
    target: HostValue,
    bridge: Bridge,
    state: AtomicU8,
    last_error: Mutex<Option<BridgeError>>,
}

impl Drop for ProxyCore {
    fn drop(&mut self) {
        log::debug!("upcall proxy for {} released", self.target.type_name());
    }
}

/// Native-side forwarder to a host object
#[derive(Clone)]
pub struct UpcallProxy {
    core: Arc<ProxyCore>,
}

impl UpcallProxy {
    /// Create a proxy holding `target` alive
    pub fn new(target: HostValue, bridge: &Bridge) -> Self {
        Self {
            core: Arc::new(ProxyCore {
                target,
                bridge: bridge.clone(),
                state: AtomicU8::new(UNATTACHED),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// The host object
    pub fn target(&self) -> &HostValue {
        &self.core.target
    }

    /// Mark the proxy as registered with a native consumer
    pub fn attach(&self) {
        if self
            .core
            .state
            .compare_exchange(UNATTACHED, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            log::debug!("upcall proxy for {} attached", self.core.target.type_name());
        }
    }

    /// Current state; a live proxy is never `Released`
    pub fn state(&self) -> ProxyState {
        match self.core.state.load(Ordering::Acquire) {
            UNATTACHED => ProxyState::Unattached,
            _ => ProxyState::Active,
        }
    }

    /// Non-owning back edge for host code
    pub fn downgrade(&self) -> WeakUpcall {
        WeakUpcall {
            core: Arc::downgrade(&self.core),
        }
    }

    /// Whether two proxies share a core
    pub fn same_proxy(&self, other: &UpcallProxy) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    /// Number of native holders of this core
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.core)
    }

    /// The last recorded failure, left in place
    pub fn last_error(&self) -> Option<BridgeError> {
        self.core.last_error.lock().clone()
    }

    /// Take the last recorded failure
    pub fn take_last_error(&self) -> Option<BridgeError> {
        self.core.last_error.lock().take()
    }

    /// The bridge this proxy wraps native arguments with
    pub fn bridge(&self) -> &Bridge {
        &self.core.bridge
    }

    /// Wrap a native argument for the host as a new owned object
    pub fn wrap_arg(&self, obj: Box<dyn NativeObject>, declared: &str) -> BridgeResult<HostValue> {
        self.core.bridge.wrap_owned(obj, declared)
    }

    /// Call the host method `method`; failures are returned, not recorded
    pub fn try_upcall<T: FromHost>(&self, method: &str, args: &[HostValue]) -> BridgeResult<T> {
        let _depth = DepthGuard::enter(method, self.core.bridge.options().max_upcall_depth)?;

        let target = &self.core.target;
        if target.as_object().is_none() {
            return Err(BridgeError::UpcallFailed {
                method: method.to_string(),
                reason: format!("{} target is not an object", target.type_name()),
            });
        }

        // wrapped native targets dispatch through their class
        let bridge = &self.core.bridge;
        let result = panic::catch_unwind(AssertUnwindSafe(|| bridge.call_method(target, method, args)))
            .map_err(|payload| BridgeError::Panic(panic_message(payload.as_ref())))?;

        let value = result.map_err(|err| match err {
            BridgeError::NoSuchMethod { .. } | BridgeError::UpcallDepthExceeded { .. } => err,
            other => BridgeError::UpcallFailed {
                method: method.to_string(),
                reason: other.to_string(),
            },
        })?;

        T::from_host(&value).map_err(|err| BridgeError::UpcallFailed {
            method: method.to_string(),
            reason: err.to_string(),
        })
    }

    /// Call the host method `method`, returning `default` on any failure.
    ///
    /// The failure is recorded on the proxy (see [`UpcallProxy::last_error`]).
    pub fn upcall<T: FromHost>(&self, method: &str, args: &[HostValue], default: T) -> T {
        match self.try_upcall(method, args) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(
                    "upcall {}.{}() failed, using default: {}",
                    self.core.target.type_name(),
                    method,
                    err
                );
                if self.core.bridge.options().record_upcall_errors {
                    *self.core.last_error.lock() = Some(err);
                }
                default
            }
        }
    }
}

impl fmt::Debug for UpcallProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpcallProxy")
            .field("target", &self.core.target)
            .field("state", &self.state())
            .field("shared", &self.share_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Non-owning reference to an upcall proxy
#[derive(Clone)]
pub struct WeakUpcall {
    core: Weak<ProxyCore>,
}

impl WeakUpcall {
    /// State of the proxy; `Released` once every native holder is gone
    pub fn state(&self) -> ProxyState {
        match self.core.upgrade() {
            Some(core) => UpcallProxy { core }.state(),
            None => ProxyState::Released,
        }
    }

    /// Whether this is a back edge to `proxy`
    pub fn is(&self, proxy: &UpcallProxy) -> bool {
        Weak::ptr_eq(&self.core, &Arc::downgrade(&proxy.core))
    }

    /// Last recorded failure, if the proxy is still alive
    pub fn last_error(&self) -> Option<BridgeError> {
        self.core.upgrade().and_then(|core| core.last_error.lock().clone())
    }
}

impl fmt::Debug for WeakUpcall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakUpcall").field("state", &self.state()).finish()
    }
}
