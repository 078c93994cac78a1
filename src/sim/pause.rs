//! Shared pause flag
//!
//! One flag is handed to every stepped subsystem at construction. Pausing
//! skips whole steps; nothing is ever observed half-updated.

use std::cell::Cell;
use std::rc::Rc;

/// Cloneable handle to a single pause flag
#[derive(Debug, Clone, Default)]
pub struct PauseFlag(Rc<Cell<bool>>);

impl PauseFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, paused: bool) {
        self.0.set(paused);
    }

    pub fn pause(&self) {
        self.set(true);
    }

    pub fn resume(&self) {
        self.set(false);
    }
}
