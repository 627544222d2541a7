//! Element Query
//!
//! Simple selector parsing plus query/matches/closest over the tree.

use crate::NodeId;
use crate::tree::DomTree;

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Class(String),
    Id(String),
    Universal,
}

impl SimpleSelector {
    /// Parse a simple selector string
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if s == "*" {
            Some(Self::Universal)
        } else if let Some(id) = s.strip_prefix('#') {
            Some(Self::Id(id.to_string()))
        } else if let Some(class) = s.strip_prefix('.') {
            Some(Self::Class(class.to_string()))
        } else {
            Some(Self::Tag(s.to_lowercase()))
        }
    }

    /// Check if an element matches this selector
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(el) = tree.get(node).and_then(|n| n.as_element()) else {
            return false;
        };
        match self {
            Self::Universal => true,
            Self::Tag(tag) => el.tag == *tag,
            Self::Class(class) => el.has_class(class),
            Self::Id(id) => el.id.as_deref() == Some(id.as_str()),
        }
    }
}

/// First descendant of `root` matching the selector, in document order
pub fn query_selector(tree: &DomTree, root: NodeId, selector: &str) -> Option<NodeId> {
    let sel = SimpleSelector::parse(selector)?;
    tree.descendants(root)
        .into_iter()
        .find(|&id| sel.matches(tree, id))
}

/// All descendants of `root` matching the selector
pub fn query_selector_all(tree: &DomTree, root: NodeId, selector: &str) -> Vec<NodeId> {
    let Some(sel) = SimpleSelector::parse(selector) else {
        return Vec::new();
    };
    tree.descendants(root)
        .into_iter()
        .filter(|&id| sel.matches(tree, id))
        .collect()
}

/// Check if an element matches a selector string
pub fn matches(tree: &DomTree, node: NodeId, selector: &str) -> bool {
    SimpleSelector::parse(selector)
        .map(|sel| sel.matches(tree, node))
        .unwrap_or(false)
}

/// Nearest ancestor-or-self matching the selector
pub fn closest(tree: &DomTree, node: NodeId, selector: &str) -> Option<NodeId> {
    let sel = SimpleSelector::parse(selector)?;
    if sel.matches(tree, node) {
        return Some(node);
    }
    tree.ancestors(node)
        .into_iter()
        .find(|&id| sel.matches(tree, id))
}
