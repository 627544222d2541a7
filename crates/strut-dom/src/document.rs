//! Document - High-level tree handle
//!
//! Cloneable single-threaded handle over the arena tree. All component
//! code goes through this facade; it owns the viewport rect and the
//! element ownership markers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::tree::{DomResult, DomTree};
use crate::{NodeId, Rect, query};

/// Element resolution target: an existing node or a selector
#[derive(Debug, Clone)]
pub enum Target {
    Selector(String),
    Node(NodeId),
}

impl From<NodeId> for Target {
    fn from(id: NodeId) -> Self {
        Target::Node(id)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Selector(s) => write!(f, "{s}"),
            Target::Node(id) => write!(f, "node #{}", id.0),
        }
    }
}

struct DocumentInner {
    tree: DomTree,
    root: NodeId,
    viewport: Rect,
}

/// Shared document handle
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Document {
    /// Create a document with a root element and a default viewport
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let root = tree.create_element("root");
        Self {
            inner: Rc::new(RefCell::new(DocumentInner {
                tree,
                root,
                viewport: Rect::from_xywh(0.0, 0.0, 1024.0, 768.0),
            })),
        }
    }

    /// Root element
    pub fn root(&self) -> NodeId {
        self.inner.borrow().root
    }

    /// Current viewport rect
    pub fn viewport(&self) -> Rect {
        self.inner.borrow().viewport
    }

    /// Update the viewport (host resize)
    pub fn set_viewport(&self, viewport: Rect) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Allocate an element node
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.borrow_mut().tree.create_element(tag)
    }

    /// Allocate a text node
    pub fn create_text(&self, content: &str) -> NodeId {
        self.inner.borrow_mut().tree.create_text(content)
    }

    /// Append a child to a parent
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.inner.borrow_mut().tree.append_child(parent, child)
    }

    /// Unlink a node from its parent
    pub fn detach(&self, id: NodeId) {
        self.inner.borrow_mut().tree.detach(id);
    }

    /// Detach every child of a node
    pub fn clear_children(&self, id: NodeId) {
        self.inner.borrow_mut().tree.clear_children(id);
    }

    /// Direct children in document order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.borrow().tree.children(id)
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.inner.borrow().tree.get(id)?.parent;
        (!parent.is_none()).then_some(parent)
    }

    /// Ancestor chain from a node up to the root (node excluded)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.inner.borrow().tree.ancestors(id)
    }

    /// Distance from the root
    pub fn depth(&self, id: NodeId) -> usize {
        self.inner.borrow().tree.depth(id)
    }

    /// Check if a node exists and is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.inner
            .borrow()
            .tree
            .get(id)
            .map(|n| n.is_element())
            .unwrap_or(false)
    }

    /// Tag name of an element
    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.inner
            .borrow()
            .tree
            .get(id)
            .and_then(|n| n.as_element())
            .map(|e| e.tag.clone())
    }

    /// Set an attribute
    pub fn set_attr(&self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self
            .inner
            .borrow_mut()
            .tree
            .get_mut(id)
            .and_then(|n| n.as_element_mut())
        {
            el.set_attr(name, value);
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, id: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .tree
            .get(id)
            .and_then(|n| n.as_element())
            .and_then(|e| e.get_attr(name))
            .map(|v| v.to_string())
    }

    /// Concatenated text content of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        self.inner.borrow().tree.text_content(id)
    }

    /// Resolve a target to zero-or-one element. Never errors for
    /// "not found".
    pub fn resolve(&self, target: &Target) -> Option<NodeId> {
        match target {
            Target::Node(id) => self.is_element(*id).then_some(*id),
            Target::Selector(sel) => self.query_selector(sel),
        }
    }

    /// First element in the document matching a selector
    pub fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        query::query_selector(&inner.tree, inner.root, selector)
    }

    /// All elements below `root` matching a selector
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Vec<NodeId> {
        query::query_selector_all(&self.inner.borrow().tree, root, selector)
    }

    /// Check if an element matches a selector
    pub fn matches(&self, id: NodeId, selector: &str) -> bool {
        query::matches(&self.inner.borrow().tree, id, selector)
    }

    /// Nearest ancestor-or-self matching a selector
    pub fn closest(&self, id: NodeId, selector: &str) -> Option<NodeId> {
        query::closest(&self.inner.borrow().tree, id, selector)
    }

    /// Ownership marker of an element
    pub fn owner_kind(&self, id: NodeId) -> Option<&'static str> {
        self.inner
            .borrow()
            .tree
            .get(id)
            .and_then(|n| n.as_element())
            .and_then(|e| e.owner)
    }

    /// Attach an ownership marker. The caller is responsible for the
    /// single-writer invariant; this overwrites unconditionally.
    pub fn claim_owner(&self, id: NodeId, kind: &'static str) {
        if let Some(el) = self
            .inner
            .borrow_mut()
            .tree
            .get_mut(id)
            .and_then(|n| n.as_element_mut())
        {
            el.owner = Some(kind);
        }
    }

    /// Remove the ownership marker
    pub fn clear_owner(&self, id: NodeId) {
        if let Some(el) = self
            .inner
            .borrow_mut()
            .tree
            .get_mut(id)
            .and_then(|n| n.as_element_mut())
        {
            el.owner = None;
        }
    }

    /// Descendant elements carrying an ownership marker, with depth
    pub fn marked_descendants(&self, root: NodeId) -> Vec<(NodeId, &'static str, usize)> {
        self.inner.borrow().tree.marked_descendants(root)
    }

    /// Layout rect of an element
    pub fn rect(&self, id: NodeId) -> Rect {
        self.inner.borrow().tree.rect(id)
    }

    /// Set the layout rect of an element
    pub fn set_rect(&self, id: NodeId, rect: Rect) -> DomResult<()> {
        self.inner.borrow_mut().tree.set_rect(id, rect)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_selector_and_node() {
        let doc = Document::new();
        let el = doc.create_element("button");
        doc.set_attr(el, "id", "go");
        doc.append_child(doc.root(), el).unwrap();

        assert_eq!(doc.resolve(&Target::from("#go")), Some(el));
        assert_eq!(doc.resolve(&Target::from(el)), Some(el));
        assert_eq!(doc.resolve(&Target::from("#missing")), None);
    }

    #[test]
    fn test_resolve_text_node_is_absent() {
        let doc = Document::new();
        let text = doc.create_text("hi");
        doc.append_child(doc.root(), text).unwrap();

        assert_eq!(doc.resolve(&Target::from(text)), None);
    }

    #[test]
    fn test_owner_marker_roundtrip() {
        let doc = Document::new();
        let el = doc.create_element("div");
        doc.append_child(doc.root(), el).unwrap();

        assert_eq!(doc.owner_kind(el), None);
        doc.claim_owner(el, "tooltip");
        assert_eq!(doc.owner_kind(el), Some("tooltip"));
        doc.clear_owner(el);
        assert_eq!(doc.owner_kind(el), None);
    }

    #[test]
    fn test_viewport_update() {
        let doc = Document::new();
        doc.set_viewport(Rect::from_xywh(0.0, 0.0, 640.0, 480.0));
        assert_eq!(doc.viewport().width, 640.0);
    }
}
