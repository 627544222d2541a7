//! Instance Registry
//!
//! Process-wide table keyed by (component kind, id) enforcing
//! at-most-one live instance per identity pair. Entries are inserted
//! at successful construction and removed exactly once at the end of
//! destruction.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::json;
use strut_dom::NodeId;

use crate::component::ComponentCore;
use crate::error::{ErrorKind, UiResult, fail};

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<&'static str, HashMap<String, Rc<ComponentCore>>>,
}

/// Shared registry handle
#[derive(Clone, Default)]
pub struct Registry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for an identity. Fails with `DuplicateIdentity`
    /// when an entry already exists.
    pub fn claim(&self, kind: &'static str, id: &str, instance: &Rc<ComponentCore>) -> UiResult<()> {
        let mut inner = self.inner.borrow_mut();
        let slots = inner.entries.entry(kind).or_default();
        if slots.contains_key(id) {
            return Err(fail(
                ErrorKind::DuplicateIdentity,
                "core.duplicate_identity",
                json!({ "kind": kind, "id": id }),
            ));
        }
        slots.insert(id.to_string(), instance.clone());
        Ok(())
    }

    /// Release the slot, but only if it is still owned by `instance`.
    /// A stale release after replacement is a no-op.
    pub fn release(&self, kind: &'static str, id: &str, instance: &ComponentCore) {
        let mut inner = self.inner.borrow_mut();
        if let Some(slots) = inner.entries.get_mut(kind) {
            let held_by_instance = slots
                .get(id)
                .is_some_and(|held| std::ptr::eq(Rc::as_ptr(held), instance));
            if held_by_instance {
                slots.remove(id);
            }
        }
    }

    /// Look up the live instance for an identity
    pub fn lookup(&self, kind: &str, id: &str) -> Option<Rc<ComponentCore>> {
        self.inner.borrow().entries.get(kind)?.get(id).cloned()
    }

    /// Resolve an ownership marker back to its instance: the live
    /// entry of `kind` bound to `element`.
    pub fn find_by_element(&self, kind: &str, element: NodeId) -> Option<Rc<ComponentCore>> {
        self.inner
            .borrow()
            .entries
            .get(kind)?
            .values()
            .find(|core| core.element() == element)
            .cloned()
    }

    /// Number of live entries across all kinds
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.values().map(|m| m.len()).sum()
    }

    /// Check if the registry has no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
