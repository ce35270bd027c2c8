//! Object pooling for allocation reuse
//!
//! Command buffers are rebuilt every frame. Rather than dropping their lists
//! (which frees every `Vec`) and reallocating them on the next frame, lists
//! are reset and parked in a [`Pool`] so their capacity carries over.

use parking_lot::Mutex;

/// Trait for types that can be pooled and reused.
///
/// Implementors must be able to create an empty instance and clear their
/// contents while preserving allocated capacity.
pub trait Poolable {
    /// Create a new empty instance for pool initialization.
    fn new_empty() -> Self;

    /// Reset the value to an empty state, preserving allocated capacity.
    ///
    /// For example, call `Vec::clear()` rather than replacing with a new `Vec`.
    fn reset(&mut self);
}

/// Thread-safe free list of reset values
///
/// `acquire` and `release` may be called from different threads; the lock
/// is held only for the push or pop.
#[derive(Debug)]
pub struct Pool<T: Poolable> {
    free: Mutex<Vec<T>>,
    max_retained: usize,
}

impl<T: Poolable> Pool<T> {
    /// Create a pool that keeps at most `max_retained` released values
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
        }
    }

    /// Take a value from the pool, or create an empty one
    pub fn acquire(&self) -> T {
        self.free.lock().pop().unwrap_or_else(T::new_empty)
    }

    /// Reset a value and return it to the pool
    ///
    /// Values beyond `max_retained` are dropped.
    pub fn release(&self, mut value: T) {
        value.reset();
        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(value);
        }
    }

    /// Number of values waiting for reuse
    pub fn available(&self) -> usize {
        self.free.lock().len()
    }
}
