//! Disposer
//!
//! Zero-argument, idempotent cleanup handle returned by
//! resource-acquisition calls. Clones share one-shot state: whichever
//! clone runs first consumes the callback, the rest become no-ops.

use std::cell::Cell;
use std::rc::Rc;

/// One-shot cleanup handle
#[derive(Clone)]
pub struct Disposer {
    cleanup: Rc<Cell<Option<Box<dyn FnOnce()>>>>,
}

impl Disposer {
    /// Wrap a cleanup callback
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            cleanup: Rc::new(Cell::new(Some(Box::new(cleanup)))),
        }
    }

    /// A disposer that does nothing
    pub fn noop() -> Self {
        Self {
            cleanup: Rc::new(Cell::new(None)),
        }
    }

    /// Run the cleanup. Safe to call any number of times.
    pub fn dispose(&self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }

    /// Check if the cleanup already ran
    pub fn is_disposed(&self) -> bool {
        let taken = self.cleanup.take();
        let disposed = taken.is_none();
        self.cleanup.set(taken);
        disposed
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
