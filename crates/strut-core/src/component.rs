//! Component Base
//!
//! Ownership, resource tracking and the cascading destruction engine.
//! A concrete component constructs through [`ComponentCore`], which
//! claims its identity in the registry, marks the bound element, and
//! tracks every resource acquired through the `acquire_*` facade.
//!
//! Destruction walks the live DOM below the bound element for
//! ownership markers rather than a held child list: components are
//! constructed independently and may be created or destroyed in any
//! order by unrelated code, so the DOM itself is the only
//! always-current source of parent/child ownership at teardown time.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use serde_json::json;
use strut_dom::{
    AbortController, Disposer, EventHandler, FrameId, IntersectionEntry, IntersectionOptions,
    ListenerOptions, MutationOptions, MutationRecord, NodeId, ResizeEntry, Target, TimerId,
};

use crate::error::{ErrorKind, UiResult, ensure, fail};
use crate::runtime::Runtime;

/// Character forbidden at the start of a component id (reserved for
/// fragment selectors)
pub const FORBIDDEN_ID_PREFIX: char = '#';

/// Lifecycle state machine. `Active` is the only state in which
/// resources may be acquired or `destruct` may begin; `Destructed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Destructing,
    Destructed,
}

/// The (kind, id) pair uniquely naming a live instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub kind: &'static str,
    pub id: String,
}

struct ListenerRecord {
    target: NodeId,
    event_type: String,
    selector: Option<String>,
    handler: EventHandler,
}

/// Resource sets owned exclusively by the instance until released
#[derive(Default)]
struct Resources {
    listeners: Vec<ListenerRecord>,
    disposers: Vec<Disposer>,
    timeouts: HashSet<TimerId>,
    intervals: HashSet<TimerId>,
    frames: HashSet<FrameId>,
    abortables: Vec<AbortController>,
}

/// Component base: identity, bound element, lifecycle state and
/// tracked resources.
pub struct ComponentCore {
    identity: Identity,
    element: NodeId,
    runtime: Runtime,
    state: Cell<Lifecycle>,
    resources: RefCell<Resources>,
    weak_self: Weak<ComponentCore>,
    span: tracing::Span,
}

/// Guarantees the terminal state transition no matter which sweep step
/// failed.
struct StateGuard<'a> {
    state: &'a Cell<Lifecycle>,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.state.set(Lifecycle::Destructed);
    }
}

impl ComponentCore {
    /// Construct a component of `kind` with caller-supplied `id`,
    /// bound to the element `target` resolves to.
    ///
    /// Validation order: element resolution, id shape, registry
    /// collision, ownership marker. The registry claim is the last
    /// step, so a failure leaves no partial registration.
    pub fn construct(
        runtime: &Runtime,
        kind: &'static str,
        id: impl Into<String>,
        target: impl Into<Target>,
    ) -> UiResult<Rc<Self>> {
        let id = id.into();
        let target = target.into();
        let doc = runtime.document();

        let element = doc.resolve(&target).ok_or_else(|| {
            fail(
                ErrorKind::ElementNotFound,
                "core.element_not_found",
                json!({ "target": target.to_string() }),
            )
        })?;
        ensure(
            !id.is_empty() && !id.starts_with(FORBIDDEN_ID_PREFIX),
            ErrorKind::InvalidIdentity,
            "core.invalid_identity",
            || json!({ "id": id }),
        )?;
        ensure(
            runtime.registry().lookup(kind, &id).is_none(),
            ErrorKind::DuplicateIdentity,
            "core.duplicate_identity",
            || json!({ "kind": kind, "id": id }),
        )?;
        let owner = doc.owner_kind(element);
        ensure(
            owner.is_none() || owner == Some(kind),
            ErrorKind::OwnershipConflict,
            "core.ownership_conflict",
            || json!({ "kind": kind, "id": id, "owner": owner }),
        )?;

        doc.claim_owner(element, kind);
        let span = tracing::info_span!("component", kind, id = %id);
        let core = Rc::new_cyclic(|weak| Self {
            identity: Identity {
                kind,
                id: id.clone(),
            },
            element,
            runtime: runtime.clone(),
            state: Cell::new(Lifecycle::Active),
            resources: RefCell::new(Resources::default()),
            weak_self: weak.clone(),
            span,
        });
        if let Err(err) = runtime.registry().claim(kind, &id, &core) {
            doc.clear_owner(element);
            return Err(err);
        }
        tracing::info!(parent: &core.span, "constructed");
        Ok(core)
    }

    /// Component identity
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Component kind
    pub fn kind(&self) -> &'static str {
        self.identity.kind
    }

    /// Component id
    pub fn id(&self) -> &str {
        &self.identity.id
    }

    /// Bound element
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Current lifecycle state
    pub fn state(&self) -> Lifecycle {
        self.state.get()
    }

    /// The runtime this component was constructed with
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// The instance's scoped span (kind + id)
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    fn ensure_active(&self) -> UiResult<()> {
        match self.state.get() {
            Lifecycle::Active => Ok(()),
            Lifecycle::Destructing => {
                Err(self.state_error(ErrorKind::DestructInProgress, "core.destruct_in_progress"))
            }
            Lifecycle::Destructed => {
                Err(self.state_error(ErrorKind::AlreadyDestructed, "core.already_destructed"))
            }
        }
    }

    fn state_error(&self, kind: ErrorKind, code: &str) -> crate::error::UiError {
        fail(
            kind,
            code,
            json!({ "kind": self.identity.kind, "id": self.identity.id }),
        )
    }

    /// Subscribe a (possibly delegated) listener through the event
    /// bus and track it. Returns a disposer that unsubscribes this
    /// listener individually.
    pub fn acquire_listener(
        &self,
        target: NodeId,
        event_type: &str,
        selector: Option<&str>,
        handler: EventHandler,
        options: ListenerOptions,
    ) -> UiResult<Disposer> {
        self.ensure_active()?;
        self.runtime
            .events()
            .subscribe(target, event_type, selector, handler.clone(), options);
        self.resources.borrow_mut().listeners.push(ListenerRecord {
            target,
            event_type: event_type.to_string(),
            selector: selector.map(String::from),
            handler: handler.clone(),
        });

        let weak = self.weak_self.clone();
        let event_type = event_type.to_string();
        let selector = selector.map(String::from);
        Ok(Disposer::new(move || {
            let Some(core) = weak.upgrade() else { return };
            core.runtime
                .events()
                .unsubscribe(target, &event_type, selector.as_deref(), &handler);
            core.resources.borrow_mut().listeners.retain(|r| {
                !(r.target == target
                    && r.event_type == event_type
                    && r.selector == selector
                    && Rc::ptr_eq(&r.handler, &handler))
            });
        }))
    }

    /// Track a zero-arg cleanup callback to run at destruction
    pub fn acquire_disposer(&self, cleanup: impl FnOnce() + 'static) -> UiResult<Disposer> {
        self.ensure_active()?;
        let disposer = Disposer::new(cleanup);
        self.resources.borrow_mut().disposers.push(disposer.clone());
        Ok(disposer)
    }

    /// Observe an element for size changes; the observer's disposer is
    /// tracked like any other cleanup callback.
    pub fn acquire_resize_observer(
        &self,
        target: NodeId,
        callback: impl Fn(&ResizeEntry) + 'static,
    ) -> UiResult<Disposer> {
        self.ensure_active()?;
        let disposer = self.runtime.observers().observe_resize(target, callback);
        self.resources.borrow_mut().disposers.push(disposer.clone());
        Ok(disposer)
    }

    /// Observe an element for viewport intersection changes
    pub fn acquire_intersection_observer(
        &self,
        target: NodeId,
        options: IntersectionOptions,
        callback: impl Fn(&IntersectionEntry) + 'static,
    ) -> UiResult<Disposer> {
        self.ensure_active()?;
        let disposer = self
            .runtime
            .observers()
            .observe_intersection(target, options, callback);
        self.resources.borrow_mut().disposers.push(disposer.clone());
        Ok(disposer)
    }

    /// Observe a subtree for structural mutations
    pub fn acquire_mutation_observer(
        &self,
        target: NodeId,
        options: MutationOptions,
        callback: impl Fn(&MutationRecord) + 'static,
    ) -> UiResult<Disposer> {
        self.ensure_active()?;
        let disposer = self
            .runtime
            .observers()
            .observe_mutation(target, options, callback);
        self.resources.borrow_mut().disposers.push(disposer.clone());
        Ok(disposer)
    }

    /// Schedule a tracked one-shot timeout. The handle untracks itself
    /// when it fires, so firing and destruction cannot double-cancel.
    pub fn acquire_timeout(
        &self,
        delay_ms: u64,
        callback: impl FnOnce() + 'static,
    ) -> UiResult<TimerId> {
        self.ensure_active()?;
        let weak = self.weak_self.clone();
        let slot: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
        let fired_slot = slot.clone();
        let id = self.runtime.scheduler().set_timeout(delay_ms, move || {
            if let (Some(core), Some(id)) = (weak.upgrade(), fired_slot.get()) {
                core.resources.borrow_mut().timeouts.remove(&id);
            }
            callback();
        });
        slot.set(Some(id));
        self.resources.borrow_mut().timeouts.insert(id);
        Ok(id)
    }

    /// Cancel a tracked timeout and untrack it
    pub fn clear_timeout(&self, id: TimerId) {
        self.runtime.scheduler().clear(id);
        self.resources.borrow_mut().timeouts.remove(&id);
    }

    /// Schedule a tracked repeating interval
    pub fn acquire_interval(
        &self,
        delay_ms: u64,
        callback: impl FnMut() + 'static,
    ) -> UiResult<TimerId> {
        self.ensure_active()?;
        let id = self.runtime.scheduler().set_interval(delay_ms, callback);
        self.resources.borrow_mut().intervals.insert(id);
        Ok(id)
    }

    /// Cancel a tracked interval and untrack it
    pub fn clear_interval(&self, id: TimerId) {
        self.runtime.scheduler().clear(id);
        self.resources.borrow_mut().intervals.remove(&id);
    }

    /// Queue a tracked animation frame callback. The handle untracks
    /// itself when it fires.
    pub fn acquire_frame(&self, callback: impl FnOnce(f64) + 'static) -> UiResult<FrameId> {
        self.ensure_active()?;
        let weak = self.weak_self.clone();
        let slot: Rc<Cell<Option<FrameId>>> = Rc::new(Cell::new(None));
        let fired_slot = slot.clone();
        let id = self.runtime.scheduler().request_frame(move |timestamp| {
            if let (Some(core), Some(id)) = (weak.upgrade(), fired_slot.get()) {
                core.resources.borrow_mut().frames.remove(&id);
            }
            callback(timestamp);
        });
        slot.set(Some(id));
        self.resources.borrow_mut().frames.insert(id);
        Ok(id)
    }

    /// Cancel a tracked frame callback and untrack it
    pub fn cancel_frame(&self, id: FrameId) {
        self.runtime.scheduler().cancel_frame(id);
        self.resources.borrow_mut().frames.remove(&id);
    }

    /// Track an abort-capable handle to be aborted at destruction
    pub fn acquire_abortable(&self, controller: &AbortController) -> UiResult<()> {
        self.ensure_active()?;
        self.resources.borrow_mut().abortables.push(controller.clone());
        Ok(())
    }

    /// Destroy this instance and, first, every component owning an
    /// element inside its subtree (deepest first). Valid only from
    /// `Active`; repeated or re-entrant calls fail loudly.
    ///
    /// Each sweep step is best-effort: a failing child destructor or
    /// cleanup callback is logged and the sweep continues. The
    /// instance always ends `Destructed`.
    pub fn destruct(&self) -> UiResult<()> {
        match self.state.get() {
            Lifecycle::Active => {}
            Lifecycle::Destructing => {
                return Err(
                    self.state_error(ErrorKind::DestructInProgress, "core.destruct_in_progress")
                );
            }
            Lifecycle::Destructed => {
                return Err(
                    self.state_error(ErrorKind::AlreadyDestructed, "core.already_destructed")
                );
            }
        }
        self.state.set(Lifecycle::Destructing);
        let _entered = self.span.enter();
        let guard = StateGuard { state: &self.state };

        let doc = self.runtime.document().clone();

        // The DOM scan is the child discovery mechanism: descendants
        // self-registered by marking their elements, so sorting the
        // markers deepest-first yields a bottom-up cascade.
        let mut marked = doc.marked_descendants(self.element);
        marked.sort_by(|a, b| b.2.cmp(&a.2));
        for (node, kind, _depth) in marked {
            let Some(child) = self.runtime.registry().find_by_element(kind, node) else {
                continue;
            };
            if child.state() != Lifecycle::Active {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| child.destruct())) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(child_kind = kind, error = %err, "child destructor failed");
                }
                Err(_) => {
                    tracing::error!(child_kind = kind, "child destructor panicked");
                }
            }
        }

        // Take the sets out so cleanup callbacks may re-enter the core.
        let resources = self.resources.take();

        for record in resources.listeners {
            self.runtime.events().unsubscribe(
                record.target,
                &record.event_type,
                record.selector.as_deref(),
                &record.handler,
            );
        }
        for disposer in resources.disposers {
            if catch_unwind(AssertUnwindSafe(|| disposer.dispose())).is_err() {
                tracing::error!("disposer panicked");
            }
        }
        for id in resources.timeouts {
            self.runtime.scheduler().clear(id);
        }
        for id in resources.intervals {
            self.runtime.scheduler().clear(id);
        }
        for id in resources.frames {
            self.runtime.scheduler().cancel_frame(id);
        }
        for controller in resources.abortables {
            controller.abort(Some("owner destructed"));
        }

        doc.clear_children(self.element);
        doc.clear_owner(self.element);
        self.runtime
            .registry()
            .release(self.identity.kind, &self.identity.id, self);

        drop(guard);
        tracing::info!("destructed");
        Ok(())
    }
}

impl std::fmt::Debug for ComponentCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCore")
            .field("identity", &self.identity)
            .field("element", &self.element)
            .field("state", &self.state.get())
            .finish()
    }
}
