//! Event Bus
//!
//! Delegated event subscription and bubbling dispatch. A delegated
//! subscription (one with a selector) fires on the deepest node
//! between the event's originating node and the subscription target
//! that matches the selector, and its handler receives that node.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::NodeId;
use crate::document::Document;

/// Handler invoked with the event and the receiving node
pub type EventHandler = Rc<dyn Fn(&mut UiEvent, NodeId)>;

/// Listener subscription options
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// Unsubscribe after the first invocation
    pub once: bool,
}

/// Subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// UI event
#[derive(Debug)]
pub struct UiEvent {
    pub event_type: String,
    /// Originating node
    pub target: NodeId,
    /// Node whose listener is currently running
    pub current_target: NodeId,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl UiEvent {
    /// Create an event originating at `target`
    pub fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            current_target: target,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    /// Stop the event from bubbling past the current node
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Check if propagation was stopped
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

struct ListenerEntry {
    id: ListenerId,
    event_type: String,
    selector: Option<String>,
    handler: EventHandler,
    options: ListenerOptions,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: HashMap<NodeId, Vec<ListenerEntry>>,
}

/// Shared event bus handle
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler on `target`. With a selector the
    /// subscription is delegated.
    pub fn subscribe(
        &self,
        target: NodeId,
        event_type: &str,
        selector: Option<&str>,
        handler: EventHandler,
        options: ListenerOptions,
    ) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.listeners.entry(target).or_default().push(ListenerEntry {
            id,
            event_type: event_type.to_string(),
            selector: selector.map(|s| s.to_string()),
            handler,
            options,
        });
        id
    }

    /// Unsubscribe by (target, type, selector, handler) identity.
    /// Handler identity is pointer equality.
    pub fn unsubscribe(
        &self,
        target: NodeId,
        event_type: &str,
        selector: Option<&str>,
        handler: &EventHandler,
    ) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entries) = inner.listeners.get_mut(&target) {
            entries.retain(|e| {
                !(e.event_type == event_type
                    && e.selector.as_deref() == selector
                    && Rc::ptr_eq(&e.handler, handler))
            });
        }
    }

    /// Remove a single subscription by id
    pub fn remove(&self, target: NodeId, id: ListenerId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entries) = inner.listeners.get_mut(&target) {
            entries.retain(|e| e.id != id);
        }
    }

    /// Number of subscriptions on a node
    pub fn listener_count(&self, target: NodeId) -> usize {
        self.inner
            .borrow()
            .listeners
            .get(&target)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    /// Dispatch an event, bubbling from the originating node to the
    /// root. Handlers may freely subscribe/unsubscribe during dispatch.
    pub fn dispatch(&self, doc: &Document, event: &mut UiEvent) {
        tracing::trace!(event_type = %event.event_type, "dispatch");
        let mut path = vec![event.target];
        path.extend(doc.ancestors(event.target));

        for (hop, &node) in path.iter().enumerate() {
            // Snapshot matching listeners so handlers can mutate the bus.
            let matched: Vec<(ListenerId, Option<String>, EventHandler, bool)> = {
                let inner = self.inner.borrow();
                inner
                    .listeners
                    .get(&node)
                    .map(|entries| {
                        entries
                            .iter()
                            .filter(|e| e.event_type == event.event_type)
                            .map(|e| {
                                (e.id, e.selector.clone(), e.handler.clone(), e.options.once)
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            };

            for (id, selector, handler, once) in matched {
                let receiver = match &selector {
                    None => node,
                    Some(sel) => {
                        // Walk from the originating node up to (exclusive
                        // of) the subscription target, stopping at the
                        // first match.
                        match path[..hop].iter().find(|&&n| doc.matches(n, sel)) {
                            Some(&n) => n,
                            None => continue,
                        }
                    }
                };
                event.current_target = node;
                handler(event, receiver);
                if once {
                    self.remove(node, id);
                }
            }

            if event.is_propagation_stopped() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn fixture() -> (Document, NodeId, NodeId, NodeId) {
        let doc = Document::new();
        let list = doc.create_element("ul");
        let item = doc.create_element("li");
        let link = doc.create_element("a");
        doc.set_attr(item, "class", "item");
        doc.append_child(doc.root(), list).unwrap();
        doc.append_child(list, item).unwrap();
        doc.append_child(item, link).unwrap();
        (doc, list, item, link)
    }

    #[test]
    fn test_bubbling_order() {
        let (doc, list, item, link) = fixture();
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for (name, node) in [("link", link), ("item", item), ("list", list)] {
            let o = order.clone();
            bus.subscribe(
                node,
                "click",
                None,
                Rc::new(move |_e, _n| o.borrow_mut().push(name)),
                ListenerOptions::default(),
            );
        }

        bus.dispatch(&doc, &mut UiEvent::new("click", link));
        assert_eq!(*order.borrow(), vec!["link", "item", "list"]);
    }

    #[test]
    fn test_delegation_matches_deepest() {
        let (doc, list, item, link) = fixture();
        let bus = EventBus::new();
        let received = Rc::new(RefCell::new(None));

        let r = received.clone();
        bus.subscribe(
            list,
            "click",
            Some(".item"),
            Rc::new(move |_e, receiver| *r.borrow_mut() = Some(receiver)),
            ListenerOptions::default(),
        );

        bus.dispatch(&doc, &mut UiEvent::new("click", link));
        assert_eq!(*received.borrow(), Some(item));
    }

    #[test]
    fn test_delegation_no_match_skips() {
        let (doc, list, _item, link) = fixture();
        let bus = EventBus::new();
        let fired = Rc::new(RefCell::new(false));

        let f = fired.clone();
        bus.subscribe(
            list,
            "click",
            Some(".absent"),
            Rc::new(move |_e, _n| *f.borrow_mut() = true),
            ListenerOptions::default(),
        );

        bus.dispatch(&doc, &mut UiEvent::new("click", link));
        assert!(!*fired.borrow());
    }

    #[test]
    fn test_stop_propagation() {
        let (doc, list, item, link) = fixture();
        let bus = EventBus::new();
        let reached_list = Rc::new(RefCell::new(false));

        bus.subscribe(
            item,
            "click",
            None,
            Rc::new(|e, _n| e.stop_propagation()),
            ListenerOptions::default(),
        );
        let r = reached_list.clone();
        bus.subscribe(
            list,
            "click",
            None,
            Rc::new(move |_e, _n| *r.borrow_mut() = true),
            ListenerOptions::default(),
        );

        bus.dispatch(&doc, &mut UiEvent::new("click", link));
        assert!(!*reached_list.borrow());
    }

    #[test]
    fn test_once_unsubscribes() {
        let (doc, _list, _item, link) = fixture();
        let bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        bus.subscribe(
            link,
            "click",
            None,
            Rc::new(move |_e, _n| *c.borrow_mut() += 1),
            ListenerOptions { once: true },
        );

        bus.dispatch(&doc, &mut UiEvent::new("click", link));
        bus.dispatch(&doc, &mut UiEvent::new("click", link));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.listener_count(link), 0);
    }

    #[test]
    fn test_unsubscribe_by_handler_identity() {
        let (doc, _list, _item, link) = fixture();
        let bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));

        let c = count.clone();
        let handler: EventHandler = Rc::new(move |_e, _n| *c.borrow_mut() += 1);
        bus.subscribe(link, "click", None, handler.clone(), ListenerOptions::default());
        bus.unsubscribe(link, "click", None, &handler);

        bus.dispatch(&doc, &mut UiEvent::new("click", link));
        assert_eq!(*count.borrow(), 0);
    }
}
