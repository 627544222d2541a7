//! DOM Tree (arena-based allocation)
//!
//! Core node manipulation: append, detach, subtree clearing, depth and
//! descendant walks.

use crate::node::Node;
use crate::{NodeId, Rect};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("node not found")]
    NotFound,
    /// Hierarchy error (e.g., inserting an ancestor into its descendant)
    #[error("hierarchy request error")]
    HierarchyRequest,
    /// Operation requires an element node
    #[error("node is not an element")]
    NotAnElement,
}

/// Arena-based DOM tree
#[derive(Debug, Default)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new empty DOM tree
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new element node
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(Node::element(tag))
    }

    /// Allocate a new text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.insert(Node::text(content.to_string()))
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append a child to a parent, detaching it from any previous parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }

        self.detach(child);

        let prev_last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev_last;
        }
        if prev_last.is_none() {
            self.nodes[parent.index()].first_child = child;
        } else {
            self.nodes[prev_last.index()].next_sibling = child;
        }
        self.nodes[parent.index()].last_child = child;

        Ok(child)
    }

    /// Unlink a node from its parent. The subtree stays intact and can
    /// be re-appended elsewhere.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let parent = node.parent;
        let prev = node.prev_sibling;
        let next = node.next_sibling;

        if prev.is_none() {
            if !parent.is_none() {
                self.nodes[parent.index()].first_child = next;
            }
        } else {
            self.nodes[prev.index()].next_sibling = next;
        }
        if next.is_none() {
            if !parent.is_none() {
                self.nodes[parent.index()].last_child = prev;
            }
        } else {
            self.nodes[next.index()].prev_sibling = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Detach every child of a node
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(child) = self.get(id).map(|n| n.first_child) {
            if child.is_none() {
                break;
            }
            self.detach(child);
        }
    }

    /// Check if `ancestor` is an ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).map(|n| n.parent).unwrap_or(NodeId::NONE);
        while !current.is_none() {
            if current == ancestor {
                return true;
            }
            current = self.nodes[current.index()].parent;
        }
        false
    }

    /// Distance from the tree root (a detached node is its own root)
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE);
        while !current.is_none() {
            depth += 1;
            current = self.nodes[current.index()].parent;
        }
        depth
    }

    /// Pre-order walk of the subtree below `root` (root excluded)
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        if let Some(node) = self.get(root) {
            let mut child = node.first_child;
            while !child.is_none() {
                stack.push(child);
                child = self.nodes[child.index()].next_sibling;
            }
        }
        // Stack holds siblings in document order; pop from the front
        // by reversing each level as it is pushed.
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut grandchildren = Vec::new();
            let mut child = self.nodes[id.index()].first_child;
            while !child.is_none() {
                grandchildren.push(child);
                child = self.nodes[child.index()].next_sibling;
            }
            for gc in grandchildren.into_iter().rev() {
                stack.push(gc);
            }
        }
        out
    }

    /// Descendant elements carrying an ownership marker, with their depth
    pub fn marked_descendants(&self, root: NodeId) -> Vec<(NodeId, &'static str, usize)> {
        self.descendants(root)
            .into_iter()
            .filter_map(|id| {
                let owner = self.get(id).and_then(|n| n.as_element()).and_then(|e| e.owner)?;
                Some((id, owner, self.depth(id)))
            })
            .collect()
    }

    /// Ancestor chain from a node up to the root (node excluded)
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE);
        while !current.is_none() {
            out.push(current);
            current = self.nodes[current.index()].parent;
        }
        out
    }

    /// Direct children in document order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(node) = self.get(id) {
            let mut child = node.first_child;
            while !child.is_none() {
                out.push(child);
                child = self.nodes[child.index()].next_sibling;
            }
        }
        out
    }

    /// Concatenated text content of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(|n| n.as_text()) {
            out.push_str(text);
        }
        for child in self.descendants(id) {
            if let Some(text) = self.nodes[child.index()].as_text() {
                out.push_str(text);
            }
        }
        out
    }

    /// Set an element's layout rect
    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> DomResult<()> {
        let el = self
            .get_mut(id)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement)?;
        el.rect = rect;
        Ok(())
    }

    /// Get an element's layout rect
    pub fn rect(&self, id: NodeId) -> Rect {
        self.get(id)
            .and_then(|n| n.as_element())
            .map(|e| e.rect)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_children() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        let a = tree.create_element("span");
        let b = tree.create_element("span");

        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();

        assert_eq!(tree.children(root), vec![a, b]);
        assert_eq!(tree.get(a).unwrap().parent, root);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        let child = tree.create_element("div");
        tree.append_child(root, child).unwrap();

        assert_eq!(
            tree.append_child(child, root),
            Err(DomError::HierarchyRequest)
        );
        assert_eq!(tree.append_child(root, root), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_detach_relinks_siblings() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        let a = tree.create_element("i");
        let b = tree.create_element("i");
        let c = tree.create_element("i");
        for id in [a, b, c] {
            tree.append_child(root, id).unwrap();
        }

        tree.detach(b);

        assert_eq!(tree.children(root), vec![a, c]);
        assert!(tree.get(b).unwrap().parent.is_none());
    }

    #[test]
    fn test_clear_children() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        let a = tree.create_element("p");
        let b = tree.create_element("p");
        tree.append_child(root, a).unwrap();
        tree.append_child(root, b).unwrap();

        tree.clear_children(root);

        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn test_depth_and_descendants() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        let mid = tree.create_element("div");
        let leaf = tree.create_element("div");
        tree.append_child(root, mid).unwrap();
        tree.append_child(mid, leaf).unwrap();

        assert_eq!(tree.depth(root), 0);
        assert_eq!(tree.depth(leaf), 2);
        assert_eq!(tree.descendants(root), vec![mid, leaf]);
    }

    #[test]
    fn test_marked_descendants() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        let shallow = tree.create_element("div");
        let deep_parent = tree.create_element("div");
        let deep = tree.create_element("div");
        tree.append_child(root, shallow).unwrap();
        tree.append_child(root, deep_parent).unwrap();
        tree.append_child(deep_parent, deep).unwrap();

        tree.get_mut(shallow).unwrap().as_element_mut().unwrap().owner = Some("menu");
        tree.get_mut(deep).unwrap().as_element_mut().unwrap().owner = Some("tooltip");

        let marked = tree.marked_descendants(root);
        assert_eq!(marked.len(), 2);
        assert!(marked.contains(&(shallow, "menu", 1)));
        assert!(marked.contains(&(deep, "tooltip", 2)));
    }

    #[test]
    fn test_text_content() {
        let mut tree = DomTree::new();
        let root = tree.create_element("p");
        let hello = tree.create_text("hello ");
        let span = tree.create_element("span");
        let world = tree.create_text("world");
        tree.append_child(root, hello).unwrap();
        tree.append_child(root, span).unwrap();
        tree.append_child(span, world).unwrap();

        assert_eq!(tree.text_content(root), "hello world");
    }
}
