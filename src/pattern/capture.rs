//! Capture slots
//!
//! A capture predicate writes the value it observes into a slot owned by
//! the caller. The write happens whenever the predicate runs, even if a
//! later predicate makes the overall match fail.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared cell receiving a value observed during matching
///
/// Cloning a slot yields another handle to the same cell: hand a clone to
/// the matcher and read the original after matching.
pub struct CaptureSlot<T: Copy>(Rc<Cell<Option<T>>>);

impl<T: Copy> CaptureSlot<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(None)))
    }

    /// Last captured value
    pub fn get(&self) -> Option<T> {
        self.0.get()
    }

    /// Store a value
    pub fn set(&self, value: T) {
        self.0.set(Some(value));
    }

    /// Forget the captured value
    pub fn clear(&self) {
        self.0.set(None);
    }

    /// Check if a value was captured
    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

impl<T: Copy> Clone for CaptureSlot<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Copy> Default for CaptureSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for CaptureSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CaptureSlot").field(&self.get()).finish()
    }
}
