//! Strut Tooltip
//!
//! Anchor-relative tooltip placement with viewport-fit fallback search
//! and arrow alignment, plus the tooltip component built on the Strut
//! component base.

mod placement;
mod tooltip;

pub use placement::{
    ARROW_INSET, Align, Placement, PlacementRequest, ResolvedPlacement, Side, VIEWPORT_MARGIN,
    arrow_offset, resolve_placement,
};
pub use tooltip::{TOOLTIP_KIND, Tooltip, TooltipOptions};
