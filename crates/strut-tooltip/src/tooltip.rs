//! Tooltip Component
//!
//! A concrete component built on the Strut component base: binds to an
//! anchor element, shows a bubble element placed by the placement
//! engine, and acquires every listener, observer and timer through the
//! base facade so teardown is a single `destruct()`.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;
use strut_core::{ComponentCore, Runtime, UiResult};
use strut_dom::{ListenerOptions, NodeId, Rect, Target, TimerId};

use crate::placement::{
    Align, Placement, PlacementRequest, ResolvedPlacement, Side, arrow_offset, resolve_placement,
};

/// Component kind of every tooltip instance
pub const TOOLTIP_KIND: &str = "tooltip";

/// Tooltip configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TooltipOptions {
    pub side: Side,
    pub align: Align,
    /// Search the fallback ladder when the preferred placement
    /// overflows the viewport
    pub auto: bool,
    /// Gap between anchor and bubble
    pub offset: f64,
    pub show_delay_ms: u64,
    pub hide_delay_ms: u64,
    /// Bubble text content
    pub content: String,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            side: Side::Top,
            align: Align::Center,
            auto: true,
            offset: 8.0,
            show_delay_ms: 0,
            hide_delay_ms: 0,
            content: String::new(),
        }
    }
}

struct TooltipState {
    options: TooltipOptions,
    bubble: Option<NodeId>,
    visible: bool,
    resolved: Option<ResolvedPlacement>,
    arrow: f64,
    pending_show: Option<TimerId>,
    pending_hide: Option<TimerId>,
}

/// Tooltip bound to an anchor element
pub struct Tooltip {
    core: Rc<ComponentCore>,
    state: Rc<RefCell<TooltipState>>,
}

impl Tooltip {
    /// Attach a tooltip to an anchor. Pointer enter/leave on the
    /// anchor toggles the bubble after the configured delays; anchor
    /// resizes re-run placement while visible.
    pub fn attach(
        runtime: &Runtime,
        id: impl Into<String>,
        anchor: impl Into<Target>,
        options: TooltipOptions,
    ) -> UiResult<Tooltip> {
        let core = ComponentCore::construct(runtime, TOOLTIP_KIND, id, anchor)?;
        let state = Rc::new(RefCell::new(TooltipState {
            options,
            bubble: None,
            visible: false,
            resolved: None,
            arrow: 0.0,
            pending_show: None,
            pending_hide: None,
        }));

        let anchor_el = core.element();

        let weak = Rc::downgrade(&core);
        let enter_state = state.clone();
        core.acquire_listener(
            anchor_el,
            "pointerenter",
            None,
            Rc::new(move |_event, _node| {
                if let Some(core) = weak.upgrade() {
                    Self::schedule_show(&core, &enter_state);
                }
            }),
            ListenerOptions::default(),
        )?;

        let weak = Rc::downgrade(&core);
        let leave_state = state.clone();
        core.acquire_listener(
            anchor_el,
            "pointerleave",
            None,
            Rc::new(move |_event, _node| {
                if let Some(core) = weak.upgrade() {
                    Self::schedule_hide(&core, &leave_state);
                }
            }),
            ListenerOptions::default(),
        )?;

        // Anchor movement and viewport resizes both invalidate the
        // placement; it is recomputed, never cached.
        let weak = Rc::downgrade(&core);
        let resize_state = state.clone();
        core.acquire_resize_observer(anchor_el, move |_entry| {
            if let Some(core) = weak.upgrade() {
                Self::refresh(&core, &resize_state);
            }
        })?;

        let weak = Rc::downgrade(&core);
        let viewport_state = state.clone();
        core.acquire_listener(
            runtime.document().root(),
            "resize",
            None,
            Rc::new(move |_event, _node| {
                if let Some(core) = weak.upgrade() {
                    Self::refresh(&core, &viewport_state);
                }
            }),
            ListenerOptions::default(),
        )?;

        // The bubble lives outside the anchor subtree, so the base
        // sweep cannot reach it through clear_children.
        let doc = runtime.document().clone();
        let bubble_state = state.clone();
        core.acquire_disposer(move || {
            let mut s = bubble_state.borrow_mut();
            s.visible = false;
            if let Some(bubble) = s.bubble.take() {
                doc.detach(bubble);
            }
        })?;

        Ok(Tooltip { core, state })
    }

    /// The underlying component core
    pub fn core(&self) -> &Rc<ComponentCore> {
        &self.core
    }

    /// Bubble element, if it has been created
    pub fn bubble(&self) -> Option<NodeId> {
        self.state.borrow().bubble
    }

    /// Check if the bubble is currently shown
    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    /// Placement of the last show/reposition
    pub fn placement(&self) -> Option<ResolvedPlacement> {
        self.state.borrow().resolved
    }

    /// Arrow offset on the cross axis of the last placement
    pub fn arrow(&self) -> f64 {
        self.state.borrow().arrow
    }

    /// Show immediately, bypassing the show delay
    pub fn show(&self) -> UiResult<()> {
        Self::show_now(&self.core, &self.state)
    }

    /// Hide immediately, bypassing the hide delay
    pub fn hide(&self) {
        Self::hide_now(&self.core, &self.state);
    }

    /// Recompute placement from the live anchor/bubble/viewport rects
    pub fn reposition(&self) -> UiResult<()> {
        Self::reposition_now(&self.core, &self.state)
    }

    /// Tear down the component and every acquired resource
    pub fn destruct(&self) -> UiResult<()> {
        self.core.destruct()
    }

    fn schedule_show(core: &Rc<ComponentCore>, state: &Rc<RefCell<TooltipState>>) {
        let delay = {
            let mut s = state.borrow_mut();
            if let Some(id) = s.pending_hide.take() {
                core.clear_timeout(id);
            }
            if s.visible || s.pending_show.is_some() {
                return;
            }
            s.options.show_delay_ms
        };

        let weak = Rc::downgrade(core);
        let timer_state = state.clone();
        match core.acquire_timeout(delay, move || {
            timer_state.borrow_mut().pending_show = None;
            if let Some(core) = weak.upgrade() {
                if let Err(err) = Self::show_now(&core, &timer_state) {
                    tracing::warn!(error = %err, "tooltip show failed");
                }
            }
        }) {
            Ok(id) => state.borrow_mut().pending_show = Some(id),
            Err(err) => tracing::warn!(error = %err, "tooltip show not scheduled"),
        }
    }

    fn schedule_hide(core: &Rc<ComponentCore>, state: &Rc<RefCell<TooltipState>>) {
        let delay = {
            let mut s = state.borrow_mut();
            if let Some(id) = s.pending_show.take() {
                core.clear_timeout(id);
            }
            if !s.visible || s.pending_hide.is_some() {
                return;
            }
            s.options.hide_delay_ms
        };

        let weak = Rc::downgrade(core);
        let timer_state = state.clone();
        match core.acquire_timeout(delay, move || {
            timer_state.borrow_mut().pending_hide = None;
            if let Some(core) = weak.upgrade() {
                Self::hide_now(&core, &timer_state);
            }
        }) {
            Ok(id) => state.borrow_mut().pending_hide = Some(id),
            Err(err) => tracing::warn!(error = %err, "tooltip hide not scheduled"),
        }
    }

    fn show_now(core: &Rc<ComponentCore>, state: &Rc<RefCell<TooltipState>>) -> UiResult<()> {
        let doc = core.runtime().document().clone();
        let bubble = {
            let mut s = state.borrow_mut();
            match s.bubble {
                Some(bubble) => bubble,
                None => {
                    let bubble = doc.create_element("div");
                    doc.set_attr(bubble, "class", "strut-tooltip");
                    if !s.options.content.is_empty() {
                        let text = doc.create_text(&s.options.content);
                        doc.append_child(bubble, text)?;
                    }
                    s.bubble = Some(bubble);
                    bubble
                }
            }
        };
        doc.append_child(doc.root(), bubble)?;
        state.borrow_mut().visible = true;
        Self::reposition_now(core, state)
    }

    fn hide_now(core: &Rc<ComponentCore>, state: &Rc<RefCell<TooltipState>>) {
        let mut s = state.borrow_mut();
        s.visible = false;
        if let Some(bubble) = s.bubble {
            core.runtime().document().detach(bubble);
        }
    }

    fn refresh(core: &Rc<ComponentCore>, state: &Rc<RefCell<TooltipState>>) {
        if let Err(err) = Self::reposition_now(core, state) {
            tracing::warn!(error = %err, "tooltip reposition failed");
        }
    }

    fn reposition_now(core: &Rc<ComponentCore>, state: &Rc<RefCell<TooltipState>>) -> UiResult<()> {
        let doc = core.runtime().document().clone();
        let (bubble, request) = {
            let s = state.borrow();
            let Some(bubble) = s.bubble else {
                return Ok(());
            };
            if !s.visible {
                return Ok(());
            }
            let request = PlacementRequest {
                placement: Placement::new(s.options.side, s.options.align),
                auto: s.options.auto,
                offset: s.options.offset,
            };
            (bubble, request)
        };

        let anchor_rect = doc.rect(core.element());
        let size = doc.rect(bubble).size();
        let resolved = resolve_placement(anchor_rect, size, &request, doc.viewport());
        let arrow = arrow_offset(anchor_rect, &resolved, size);
        doc.set_rect(
            bubble,
            Rect::from_xywh(resolved.left, resolved.top, size.width, size.height),
        )?;

        let mut s = state.borrow_mut();
        s.resolved = Some(resolved);
        s.arrow = arrow;
        Ok(())
    }
}

impl std::fmt::Debug for Tooltip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tooltip")
            .field("core", &self.core)
            .field("visible", &self.is_visible())
            .finish()
    }
}
