//! Abort Handles
//!
//! Cancellation mechanism for in-flight operations. Single-threaded
//! counterpart of the browser AbortController/AbortSignal pair.

use std::cell::RefCell;
use std::rc::Rc;

/// Cancellation controller
#[derive(Debug, Clone, Default)]
pub struct AbortController {
    signal: AbortSignal,
}

/// Cancellation state
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    inner: Rc<RefCell<AbortSignalInner>>,
}

#[derive(Debug, Default)]
struct AbortSignalInner {
    aborted: bool,
    reason: Option<String>,
}

impl AbortController {
    /// Create a new abort controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the associated signal
    pub fn signal(&self) -> &AbortSignal {
        &self.signal
    }

    /// Abort with an optional reason. Aborting twice is a no-op.
    pub fn abort(&self, reason: Option<&str>) {
        self.signal.abort(reason);
    }
}

impl AbortSignal {
    /// Create an already-aborted signal
    pub fn aborted(reason: Option<&str>) -> Self {
        let signal = Self::default();
        signal.abort(reason);
        signal
    }

    /// Check if aborted
    pub fn is_aborted(&self) -> bool {
        self.inner.borrow().aborted
    }

    /// Get abort reason
    pub fn reason(&self) -> Option<String> {
        self.inner.borrow().reason.clone()
    }

    fn abort(&self, reason: Option<&str>) {
        let mut inner = self.inner.borrow_mut();
        if !inner.aborted {
            tracing::debug!(reason, "signal aborted");
            inner.aborted = true;
            inner.reason = reason.map(|s| s.to_string());
        }
    }
}
