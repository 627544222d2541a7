//! Placement Engine
//!
//! Pure anchor-relative placement: fixed formulas per side/alignment,
//! an auto-mode fallback ladder tested against the viewport, and arrow
//! alignment on the cross axis. A resolution is a pure function of
//! (anchor rect, content size, request, viewport) and must be
//! re-invoked whenever any of them changes.

use serde::{Deserialize, Serialize};
use strut_dom::{Rect, Size};

/// Margin kept between a placed box and the viewport edges
pub const VIEWPORT_MARGIN: f64 = 8.0;

/// Minimum distance between the arrow and the tooltip box edges
pub const ARROW_INSET: f64 = 8.0;

/// Side of the anchor the tooltip is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// The opposite side
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Check if this side places on the horizontal axis
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    /// The two sides perpendicular to this one
    pub fn perpendicular(self) -> [Side; 2] {
        if self.is_horizontal() {
            [Side::Top, Side::Bottom]
        } else {
            [Side::Left, Side::Right]
        }
    }
}

/// Alignment along the anchor's cross axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Start,
    #[default]
    Center,
    End,
}

/// A (side, align) pair describing a tooltip position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub side: Side,
    pub align: Align,
}

impl Placement {
    pub fn new(side: Side, align: Align) -> Self {
        Self { side, align }
    }
}

/// Requested placement, optionally with fallback search
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest {
    pub placement: Placement,
    /// Search the fallback ladder for a viewport-fitting candidate
    pub auto: bool,
    /// Gap between anchor and tooltip on the principal axis
    pub offset: f64,
}

/// Resolved position in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPlacement {
    pub left: f64,
    pub top: f64,
    pub placement: Placement,
}

fn position_for(anchor: Rect, size: Size, placement: Placement, offset: f64) -> (f64, f64) {
    if placement.side.is_horizontal() {
        let left = match placement.side {
            Side::Left => anchor.left() - size.width - offset,
            _ => anchor.right() + offset,
        };
        let top = match placement.align {
            Align::Start => anchor.top(),
            Align::Center => anchor.top() + (anchor.height - size.height) / 2.0,
            Align::End => anchor.bottom() - size.height,
        };
        (left, top)
    } else {
        let top = match placement.side {
            Side::Top => anchor.top() - size.height - offset,
            _ => anchor.bottom() + offset,
        };
        let left = match placement.align {
            Align::Start => anchor.left(),
            Align::Center => anchor.left() + (anchor.width - size.width) / 2.0,
            Align::End => anchor.right() - size.width,
        };
        (left, top)
    }
}

/// Fallback ladder: the preferred placement, the two sibling
/// alignments on the same side, the opposite side at the original
/// alignment, then the two perpendicular sides at center.
fn candidate_order(preferred: Placement) -> Vec<Placement> {
    let mut out = vec![preferred];
    for align in [Align::Start, Align::Center, Align::End] {
        if align != preferred.align {
            out.push(Placement::new(preferred.side, align));
        }
    }
    out.push(Placement::new(preferred.side.opposite(), preferred.align));
    for side in preferred.side.perpendicular() {
        out.push(Placement::new(side, Align::Center));
    }
    out
}

/// Compute the tooltip position for an anchor rect and a measured
/// content size. Non-auto requests use the exact formulas with no
/// fallback; auto requests return the first ladder candidate that fits
/// fully inside the viewport (inset by [`VIEWPORT_MARGIN`]), or the
/// last candidate evaluated when none fit.
pub fn resolve_placement(
    anchor: Rect,
    size: Size,
    request: &PlacementRequest,
    viewport: Rect,
) -> ResolvedPlacement {
    let evaluate = |placement: Placement| {
        let (left, top) = position_for(anchor, size, placement, request.offset);
        ResolvedPlacement {
            left,
            top,
            placement,
        }
    };

    if !request.auto {
        return evaluate(request.placement);
    }

    let fit_area = viewport.inset(VIEWPORT_MARGIN);
    let mut resolved = evaluate(request.placement);
    for candidate in candidate_order(request.placement) {
        resolved = evaluate(candidate);
        let placed = Rect::from_xywh(resolved.left, resolved.top, size.width, size.height);
        if fit_area.contains_rect(&placed) {
            return resolved;
        }
    }
    resolved
}

/// Arrow offset on the cross axis: the anchor's center projected into
/// the tooltip's local coordinates, clamped so the arrow never
/// overflows the box. The principal axis is fixed by the side.
pub fn arrow_offset(anchor: Rect, resolved: &ResolvedPlacement, size: Size) -> f64 {
    if resolved.placement.side.is_horizontal() {
        let max = (size.height - ARROW_INSET).max(ARROW_INSET);
        (anchor.center_y() - resolved.top).clamp(ARROW_INSET, max)
    } else {
        let max = (size.width - ARROW_INSET).max(ARROW_INSET);
        (anchor.center_x() - resolved.left).clamp(ARROW_INSET, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 1024.0,
        height: 768.0,
    };

    fn centered_anchor() -> Rect {
        Rect::from_xywh(462.0, 364.0, 100.0, 40.0)
    }

    fn request(side: Side, align: Align, auto: bool) -> PlacementRequest {
        PlacementRequest {
            placement: Placement::new(side, align),
            auto,
            offset: 8.0,
        }
    }

    #[test]
    fn test_top_center_exact_formula() {
        let anchor = centered_anchor();
        let size = Size::new(200.0, 50.0);

        let resolved =
            resolve_placement(anchor, size, &request(Side::Top, Align::Center, false), VIEWPORT);

        assert_eq!(resolved.top, anchor.top() - size.height - 8.0);
        assert_eq!(resolved.left, anchor.left() + (anchor.width - size.width) / 2.0);
        assert_eq!(resolved.placement, Placement::new(Side::Top, Align::Center));
    }

    #[test]
    fn test_side_formulas() {
        let anchor = centered_anchor();
        let size = Size::new(200.0, 50.0);

        let bottom =
            resolve_placement(anchor, size, &request(Side::Bottom, Align::Start, false), VIEWPORT);
        assert_eq!(bottom.top, anchor.bottom() + 8.0);
        assert_eq!(bottom.left, anchor.left());

        let left =
            resolve_placement(anchor, size, &request(Side::Left, Align::End, false), VIEWPORT);
        assert_eq!(left.left, anchor.left() - size.width - 8.0);
        assert_eq!(left.top, anchor.bottom() - size.height);

        let right =
            resolve_placement(anchor, size, &request(Side::Right, Align::Center, false), VIEWPORT);
        assert_eq!(right.left, anchor.right() + 8.0);
        assert_eq!(right.top, anchor.top() + (anchor.height - size.height) / 2.0);
    }

    #[test]
    fn test_non_auto_never_falls_back() {
        // Anchor flush with the top edge: a top placement overflows.
        let anchor = Rect::from_xywh(462.0, 0.0, 100.0, 40.0);
        let size = Size::new(200.0, 50.0);

        let resolved =
            resolve_placement(anchor, size, &request(Side::Top, Align::Center, false), VIEWPORT);

        assert_eq!(resolved.placement.side, Side::Top);
        assert!(resolved.top < 0.0);
    }

    #[test]
    fn test_auto_falls_back_to_opposite_side() {
        let anchor = Rect::from_xywh(462.0, 0.0, 100.0, 40.0);
        let size = Size::new(200.0, 50.0);

        let resolved =
            resolve_placement(anchor, size, &request(Side::Top, Align::Center, true), VIEWPORT);

        assert_eq!(resolved.placement, Placement::new(Side::Bottom, Align::Center));
        assert_eq!(resolved.top, anchor.bottom() + 8.0);
        let placed = Rect::from_xywh(resolved.left, resolved.top, size.width, size.height);
        assert!(VIEWPORT.inset(VIEWPORT_MARGIN).contains_rect(&placed));
    }

    #[test]
    fn test_auto_prefers_sibling_alignment_on_same_side() {
        // Anchor near the left edge: every left-side alignment
        // overflows, so the ladder reaches the opposite side before
        // any perpendicular candidate.
        let anchor = Rect::from_xywh(16.0, 300.0, 100.0, 40.0);
        let size = Size::new(200.0, 50.0);

        let resolved =
            resolve_placement(anchor, size, &request(Side::Left, Align::Center, true), VIEWPORT);

        // Left overflows in every alignment; the opposite side fits.
        assert_eq!(resolved.placement, Placement::new(Side::Right, Align::Center));
    }

    #[test]
    fn test_auto_none_fit_uses_last_candidate() {
        // A viewport smaller than the content: nothing can fit.
        let viewport = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let anchor = Rect::from_xywh(40.0, 40.0, 20.0, 20.0);
        let size = Size::new(400.0, 300.0);

        let resolved =
            resolve_placement(anchor, size, &request(Side::Top, Align::Center, true), viewport);

        // Last ladder entry for a top preference is (right, center).
        assert_eq!(resolved.placement, Placement::new(Side::Right, Align::Center));
    }

    #[test]
    fn test_arrow_centered_on_anchor() {
        let anchor = centered_anchor();
        let size = Size::new(200.0, 50.0);
        let resolved =
            resolve_placement(anchor, size, &request(Side::Top, Align::Center, false), VIEWPORT);

        let arrow = arrow_offset(anchor, &resolved, size);
        // Anchor center projected into tooltip-local x.
        assert_eq!(arrow, anchor.center_x() - resolved.left);
        assert_eq!(arrow, size.width / 2.0);
    }

    #[test]
    fn test_arrow_clamped_to_box() {
        let anchor = Rect::from_xywh(0.0, 300.0, 20.0, 20.0);
        let size = Size::new(200.0, 50.0);
        // Start-aligned box extends far to the right of the anchor.
        let resolved = ResolvedPlacement {
            left: anchor.left(),
            top: anchor.top() - size.height - 8.0,
            placement: Placement::new(Side::Top, Align::Start),
        };

        let arrow = arrow_offset(anchor, &resolved, size);
        assert_eq!(arrow, anchor.center_x() - resolved.left);

        // Push the box so the projection falls outside: clamp kicks in.
        let shifted = ResolvedPlacement {
            left: anchor.left() + 100.0,
            ..resolved
        };
        assert_eq!(arrow_offset(anchor, &shifted, size), ARROW_INSET);

        let far_left = ResolvedPlacement {
            left: anchor.left() - 500.0,
            ..resolved
        };
        assert_eq!(arrow_offset(anchor, &far_left, size), size.width - ARROW_INSET);
    }

    #[test]
    fn test_candidate_order() {
        let ladder = candidate_order(Placement::new(Side::Top, Align::Center));
        assert_eq!(
            ladder,
            vec![
                Placement::new(Side::Top, Align::Center),
                Placement::new(Side::Top, Align::Start),
                Placement::new(Side::Top, Align::End),
                Placement::new(Side::Bottom, Align::Center),
                Placement::new(Side::Left, Align::Center),
                Placement::new(Side::Right, Align::Center),
            ]
        );
    }
}
