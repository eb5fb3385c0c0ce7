//! Handles: ownership of native object pointers
//!
//! A `Handle` holds exactly one native pointer and knows whether the bridge
//! owns it:
//! - `Owned`: the object is released exactly once, when the handle drops
//! - `Borrowed`: the handle never releases the object; its lifetime belongs
//!   to the native library or to another handle
//!
//! A handle also carries keep-alive host references for objects the native
//! side depends on but does not itself reference-count (a locale, a filter,
//! the owner of a borrowed pointer).
//!
//! Adoption (`disown`) is the only ownership transition: an Owned handle
//! gives up the boxed object to the adopting native consumer and becomes a
//! detached Borrowed handle. A detached handle no longer dereferences its
//! pointer, since the consumer may release or move the object at any time.

use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU8, Ordering};

use lingua_sdk::{BridgeResult, HostValue};
use parking_lot::Mutex;

use crate::defaults::OwnershipPolicy;
use crate::native::NativeObject;

/// Ownership mode of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The handle releases the native object on drop
    Owned,
    /// The handle only observes the native object
    Borrowed,
}

const OWNED: u8 = 0;
const BORROWED: u8 = 1;
const DETACHED: u8 = 2;

/// Owning or borrowing reference to one native object.
pub struct Handle {
    ptr: NonNull<dyn NativeObject>,
    state: AtomicU8,
    type_name: &'static str,
    keep_alive: Mutex<Vec<HostValue>>,
}

// SAFETY: `NativeObject: Send + Sync`; the pointer is either uniquely owned
// by this handle or valid for as long as its owner (kept alive by the
// handle's keep-alive list or by the native library).
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
    /// Take ownership of a freshly created native object.
    pub fn owned(obj: Box<dyn NativeObject>) -> Self {
        Self::with_state(NonNull::from(Box::leak(obj)), OWNED)
    }

    /// Observe a native object owned elsewhere.
    ///
    /// # Safety
    /// The pointer must stay valid for the lifetime of the handle. Pass the
    /// owner through `keep_alive` when the owner is a host object.
    pub unsafe fn borrowed(ptr: NonNull<dyn NativeObject>) -> Self {
        Self::with_state(ptr, BORROWED)
    }

    /// Create a handle from a raw native pointer.
    ///
    /// Returns `None` for a null pointer: native optional returns map to the
    /// host's absent value, not to an error.
    ///
    /// # Safety
    /// For `Ownership::Owned` the pointer must come from `Box::into_raw` and
    /// must not be released by anyone else. For `Ownership::Borrowed`, see
    /// [`Handle::borrowed`].
    pub unsafe fn acquire(ptr: *mut dyn NativeObject, mode: Ownership) -> Option<Self> {
        let ptr = NonNull::new(ptr)?;
        Some(match mode {
            Ownership::Owned => Self::with_state(ptr, OWNED),
            Ownership::Borrowed => Self::with_state(ptr, BORROWED),
        })
    }

    fn with_state(ptr: NonNull<dyn NativeObject>, state: u8) -> Self {
        // SAFETY: every constructor receives a valid pointer.
        let type_name = unsafe { ptr.as_ref() }.type_info().name();
        Self {
            ptr,
            state: AtomicU8::new(state),
            type_name,
            keep_alive: Mutex::new(Vec::new()),
        }
    }

    /// Current ownership mode
    pub fn ownership(&self) -> Ownership {
        if self.state.load(Ordering::Acquire) == OWNED {
            Ownership::Owned
        } else {
            Ownership::Borrowed
        }
    }

    /// Whether the object was adopted by native code through this handle
    pub fn is_detached(&self) -> bool {
        self.state.load(Ordering::Acquire) == DETACHED
    }

    /// Native class name of the object, available even once detached
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the handle currently owns its object
    pub fn is_owned(&self) -> bool {
        self.ownership() == Ownership::Owned
    }

    /// The native object, or `None` once the handle is detached
    #[inline]
    pub fn get(&self) -> Option<&dyn NativeObject> {
        if self.is_detached() {
            return None;
        }
        // SAFETY: non-null and valid per the constructor contracts; detached
        // handles are never dereferenced.
        Some(unsafe { self.ptr.as_ref() })
    }

    /// Like [`Handle::get`], reporting a detached handle per `policy`
    pub fn native(&self, policy: OwnershipPolicy) -> BridgeResult<&dyn NativeObject> {
        self.get().ok_or_else(|| {
            policy.violation(format!(
                "{} object used after native code adopted it",
                self.type_name
            ))
        })
    }

    /// Downcast the native object to a concrete class
    pub fn downcast_ref<T: NativeObject>(&self) -> Option<&T> {
        self.get()?.downcast_ref::<T>()
    }

    /// Raw native pointer, for re-wrapping as a borrowed handle
    pub fn as_ptr(&self) -> Option<NonNull<dyn NativeObject>> {
        self.get().map(|_| self.ptr)
    }

    /// Whether two handles point at the same native object
    pub fn same_object(&self, other: &Handle) -> bool {
        !self.is_detached()
            && !other.is_detached()
            && self.ptr.as_ptr() as *const () == other.ptr.as_ptr() as *const ()
    }

    /// Keep a host object alive for as long as this handle lives
    pub fn keep_alive(&self, value: HostValue) {
        self.keep_alive.lock().push(value);
    }

    /// Drop all keep-alive references
    pub fn clear_keep_alive(&self) {
        self.keep_alive.lock().clear();
    }

    /// Number of keep-alive references held
    pub fn keep_alive_count(&self) -> usize {
        self.keep_alive.lock().len()
    }

    /// Transfer ownership of the object to native code.
    ///
    /// The handle becomes detached: it still reports `Borrowed` but no
    /// longer gives access to the object, which now belongs to its adopting
    /// consumer. Disowning a handle that is not Owned is an ownership
    /// violation handled per `policy`.
    pub fn disown(&self, policy: OwnershipPolicy) -> BridgeResult<Box<dyn NativeObject>> {
        match self
            .state
            .compare_exchange(OWNED, DETACHED, Ordering::AcqRel, Ordering::Acquire)
        {
            // SAFETY: the handle was Owned, so the pointer came from a Box
            // and nobody else has released it; the state is now DETACHED so
            // neither `Drop` nor `get` will touch it again.
            Ok(_) => Ok(unsafe { Box::from_raw(self.ptr.as_ptr()) }),
            Err(DETACHED) => Err(policy.violation(format!(
                "{} object was already adopted by native code",
                self.type_name
            ))),
            Err(_) => Err(policy.violation(format!(
                "cannot adopt borrowed {} object",
                self.type_name
            ))),
        }
    }

    /// Release the handle now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.state.swap(BORROWED, Ordering::AcqRel) == OWNED {
            // SAFETY: see `disown`.
            drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("type", &self.type_name)
            .field("ownership", &self.ownership())
            .field("detached", &self.is_detached())
            .field("keep_alive", &self.keep_alive_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeTypeInfo;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    static COUNTED: NativeTypeInfo = NativeTypeInfo::root("Counted");

    struct Counted(Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl NativeObject for Counted {
        fn type_info(&self) -> &'static NativeTypeInfo {
            &COUNTED
        }

        crate::native_any!();
    }

    fn counted() -> (Box<dyn NativeObject>, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (Box::new(Counted(drops.clone())), drops)
    }

    #[test]
    fn test_owned_released_once() {
        let (obj, drops) = counted();
        let handle = Handle::owned(obj);
        assert!(handle.is_owned());
        drop(handle);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_borrowed_never_releases() {
        let (obj, drops) = counted();
        let owner = Handle::owned(obj);
        let borrowed = unsafe { Handle::borrowed(owner.as_ptr().unwrap()) };
        assert_eq!(borrowed.ownership(), Ownership::Borrowed);
        assert!(borrowed.same_object(&owner));
        drop(borrowed);
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        owner.release();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_null_pointer_is_absent() {
        let null: *mut Counted = std::ptr::null_mut();
        let handle = unsafe { Handle::acquire(null as *mut dyn NativeObject, Ownership::Owned) };
        assert!(handle.is_none());
    }

    #[test]
    fn test_disown_transfers_ownership() {
        let (obj, drops) = counted();
        let handle = Handle::owned(obj);
        let adopted = handle.disown(OwnershipPolicy::Leak).unwrap();
        assert_eq!(handle.ownership(), Ownership::Borrowed);
        assert!(handle.is_detached());
        assert!(handle.get().is_none());
        assert!(handle.native(OwnershipPolicy::Leak).is_err());
        drop(adopted);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        drop(handle);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_disown_is_violation() {
        let (obj, drops) = counted();
        let handle = Handle::owned(obj);
        let adopted = handle.disown(OwnershipPolicy::Leak).unwrap();
        let err = handle.disown(OwnershipPolicy::Leak).unwrap_err();
        assert!(matches!(err, lingua_sdk::BridgeError::OwnershipViolation(_)));
        drop(adopted);
        drop(handle);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_borrowed_cannot_be_adopted() {
        let (obj, drops) = counted();
        let owner = Handle::owned(obj);
        let borrowed = unsafe { Handle::borrowed(owner.as_ptr().unwrap()) };
        assert!(borrowed.disown(OwnershipPolicy::Leak).is_err());
        assert!(owner.is_owned());
        drop(owner);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_keep_alive() {
        let (obj, _drops) = counted();
        let handle = Handle::owned(obj);
        let dep = HostValue::str("locale");
        handle.keep_alive(dep.clone());
        assert_eq!(handle.keep_alive_count(), 1);
        handle.clear_keep_alive();
        assert_eq!(handle.keep_alive_count(), 0);
    }
}
