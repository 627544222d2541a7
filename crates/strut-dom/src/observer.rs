//! Structural Observers
//!
//! Resize, intersection and mutation observation behind a single hub.
//! Every `observe_*` call returns an idempotent [`Disposer`] that
//! removes the watch.

use std::cell::RefCell;
use std::rc::Rc;

use crate::disposer::Disposer;
use crate::document::Document;
use crate::{NodeId, Rect, Size};

/// Resize entry delivered to resize callbacks
#[derive(Debug, Clone, Copy)]
pub struct ResizeEntry {
    pub target: NodeId,
    pub size: Size,
}

/// Intersection observer options
#[derive(Debug, Clone)]
pub struct IntersectionOptions {
    /// Root rect (None = viewport)
    pub root: Option<Rect>,
    /// Ratio at which visibility flips
    pub threshold: f64,
}

impl Default for IntersectionOptions {
    fn default() -> Self {
        Self {
            root: None,
            threshold: 0.0,
        }
    }
}

/// Intersection entry delivered to intersection callbacks
#[derive(Debug, Clone, Copy)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
}

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub attribute_name: Option<String>,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
}

/// Mutation observer options
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationOptions {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
}

type ResizeCallback = Rc<dyn Fn(&ResizeEntry)>;
type IntersectionCallback = Rc<dyn Fn(&IntersectionEntry)>;
type MutationCallback = Rc<dyn Fn(&MutationRecord)>;

struct ResizeWatch {
    id: u64,
    target: NodeId,
    last_size: Option<Size>,
    callback: ResizeCallback,
}

struct IntersectionWatch {
    id: u64,
    target: NodeId,
    options: IntersectionOptions,
    last_intersecting: Option<bool>,
    callback: IntersectionCallback,
}

struct MutationWatch {
    id: u64,
    target: NodeId,
    options: MutationOptions,
    callback: MutationCallback,
}

#[derive(Default)]
struct ObserverHub {
    next_id: u64,
    resize: Vec<ResizeWatch>,
    intersection: Vec<IntersectionWatch>,
    mutation: Vec<MutationWatch>,
}

/// Shared observer hub handle
#[derive(Clone, Default)]
pub struct Observers {
    inner: Rc<RefCell<ObserverHub>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch an element for size changes
    pub fn observe_resize(&self, target: NodeId, callback: impl Fn(&ResizeEntry) + 'static) -> Disposer {
        let id = self.next_id();
        self.inner.borrow_mut().resize.push(ResizeWatch {
            id,
            target,
            last_size: None,
            callback: Rc::new(callback),
        });
        let inner = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.borrow_mut().resize.retain(|w| w.id != id);
            }
        })
    }

    /// Watch an element for viewport intersection changes
    pub fn observe_intersection(
        &self,
        target: NodeId,
        options: IntersectionOptions,
        callback: impl Fn(&IntersectionEntry) + 'static,
    ) -> Disposer {
        let id = self.next_id();
        self.inner.borrow_mut().intersection.push(IntersectionWatch {
            id,
            target,
            options,
            last_intersecting: None,
            callback: Rc::new(callback),
        });
        let inner = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.borrow_mut().intersection.retain(|w| w.id != id);
            }
        })
    }

    /// Watch a subtree for structural mutations
    pub fn observe_mutation(
        &self,
        target: NodeId,
        options: MutationOptions,
        callback: impl Fn(&MutationRecord) + 'static,
    ) -> Disposer {
        let id = self.next_id();
        self.inner.borrow_mut().mutation.push(MutationWatch {
            id,
            target,
            options,
            callback: Rc::new(callback),
        });
        let inner = Rc::downgrade(&self.inner);
        Disposer::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.borrow_mut().mutation.retain(|w| w.id != id);
            }
        })
    }

    fn next_id(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        inner.next_id
    }

    /// Number of live watches (all kinds)
    pub fn watch_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.resize.len() + inner.intersection.len() + inner.mutation.len()
    }

    /// Compare watched rects against their last seen size and fire
    /// resize callbacks for changes.
    pub fn process_resize(&self, doc: &Document) {
        let mut due = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            for watch in inner.resize.iter_mut() {
                let size = doc.rect(watch.target).size();
                let changed = match watch.last_size {
                    Some(last) => {
                        (last.width - size.width).abs() > 0.01
                            || (last.height - size.height).abs() > 0.01
                    }
                    None => true,
                };
                if changed {
                    watch.last_size = Some(size);
                    due.push((
                        watch.callback.clone(),
                        ResizeEntry {
                            target: watch.target,
                            size,
                        },
                    ));
                }
            }
        }
        for (callback, entry) in due {
            callback(&entry);
        }
    }

    /// Recompute viewport intersection for every watch and fire
    /// callbacks for visibility flips.
    pub fn process_intersection(&self, doc: &Document) {
        let mut due = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            for watch in inner.intersection.iter_mut() {
                let rect = doc.rect(watch.target);
                let root = watch.options.root.unwrap_or_else(|| doc.viewport());
                let ratio = match rect.intersection(&root) {
                    Some(overlap) if rect.area() > 0.0 => overlap.area() / rect.area(),
                    _ => 0.0,
                };
                let is_intersecting = ratio > watch.options.threshold;
                if watch.last_intersecting != Some(is_intersecting) {
                    watch.last_intersecting = Some(is_intersecting);
                    due.push((
                        watch.callback.clone(),
                        IntersectionEntry {
                            target: watch.target,
                            intersection_ratio: ratio,
                            is_intersecting,
                        },
                    ));
                }
            }
        }
        for (callback, entry) in due {
            callback(&entry);
        }
    }

    /// Route a mutation record to every watch whose target and options
    /// accept it.
    pub fn record_mutation(&self, doc: &Document, record: MutationRecord) {
        let due: Vec<MutationCallback> = {
            let inner = self.inner.borrow();
            inner
                .mutation
                .iter()
                .filter(|w| {
                    let matches_target = w.target == record.target
                        || (w.options.subtree && doc.ancestors(record.target).contains(&w.target));
                    let matches_type = match record.mutation_type {
                        MutationType::Attributes => w.options.attributes,
                        MutationType::CharacterData => w.options.character_data,
                        MutationType::ChildList => w.options.child_list,
                    };
                    matches_target && matches_type
                })
                .map(|w| w.callback.clone())
                .collect()
        };
        for callback in due {
            callback(&record);
        }
    }
}
