//! Runtime
//!
//! Bundles the collaborator handles every component needs: document,
//! event bus, observers, scheduler and the instance registry. Cheap to
//! clone; all handles share state.

use strut_dom::{Document, EventBus, Observers, Scheduler};

use crate::registry::Registry;

/// Shared collaborator bundle
#[derive(Clone)]
pub struct Runtime {
    document: Document,
    events: EventBus,
    observers: Observers,
    scheduler: Scheduler,
    registry: Registry,
}

impl Runtime {
    /// Create a runtime with a fresh document
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// Create a runtime over an existing document
    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            events: EventBus::new(),
            observers: Observers::new(),
            scheduler: Scheduler::new(),
            registry: Registry::new(),
        }
    }

    /// The shared document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The delegated event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The structural observer hub
    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    /// The host scheduler
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The instance registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
