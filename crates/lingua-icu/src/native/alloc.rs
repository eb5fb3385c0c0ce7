//! Per-thread allocation counter for native objects
//!
//! Every native object embeds a `Tracked` marker; creating or cloning an
//! object counts an allocation, dropping it counts a release. Counters are
//! per thread so concurrently running tests do not disturb each other.

use std::cell::Cell;

thread_local! {
    static ALLOCATED: Cell<usize> = Cell::new(0);
    static RELEASED: Cell<usize> = Cell::new(0);
}

/// Snapshot of the counters of the current thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
    /// Objects created
    pub allocated: usize,
    /// Objects released
    pub released: usize,
}

impl AllocStats {
    /// Objects currently alive
    pub fn live(&self) -> usize {
        self.allocated.saturating_sub(self.released)
    }

    /// Counts accumulated since `earlier`
    pub fn since(&self, earlier: AllocStats) -> AllocStats {
        AllocStats {
            allocated: self.allocated - earlier.allocated,
            released: self.released - earlier.released,
        }
    }
}

/// Current counters of this thread
pub fn alloc_stats() -> AllocStats {
    AllocStats {
        allocated: ALLOCATED.with(Cell::get),
        released: RELEASED.with(Cell::get),
    }
}

/// Allocation marker embedded in native objects
#[derive(Debug)]
pub struct Tracked(());

impl Tracked {
    /// Count one allocation
    pub fn new() -> Self {
        ALLOCATED.with(|n| n.set(n.get() + 1));
        Tracked(())
    }
}

impl Default for Tracked {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        RELEASED.with(|n| n.set(n.get() + 1));
    }
}
