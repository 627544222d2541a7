//! Strut DOM - Element Tree Facade
//!
//! Arena-backed element tree plus the host primitives Strut components
//! consume: selector query, delegated events, structural observers,
//! timers/animation frames, and abort handles.

mod abort;
mod disposer;
mod document;
mod events;
mod geometry;
mod node;
mod observer;
mod query;
mod scheduler;
mod tree;

pub use abort::{AbortController, AbortSignal};
pub use disposer::Disposer;
pub use document::{Document, Target};
pub use events::{EventBus, EventHandler, ListenerId, ListenerOptions, UiEvent};
pub use geometry::{Rect, Size};
pub use node::{Attribute, ElementData, Node, NodeData, TextData};
pub use observer::{
    IntersectionEntry, IntersectionOptions, MutationOptions, MutationRecord, MutationType,
    Observers, ResizeEntry,
};
pub use query::SimpleSelector;
pub use scheduler::{FrameId, Scheduler, TimerId};
pub use tree::{DomError, DomResult, DomTree};

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is the sentinel
    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Raw index value
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
