use crate::search::MatchRange;
use crate::view::{Point, ViewAdapter};
use std::ops::Range;

/// Portion of the position space worth decorating: the visible area plus a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportWindow {
    pub from: usize,
    pub to: usize,
}

impl ViewportWindow {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Measure the window of `view`, extending the visible rectangle by `buffer_px`
    /// above and below. Unresolvable corners fall back to `0` and `end`.
    pub fn measure(view: &dyn ViewAdapter, buffer_px: f64, end: usize) -> Self {
        let rect = view.visible_rect();
        let from = view
            .position_at(Point::new(rect.left, rect.top - buffer_px))
            .unwrap_or(0);
        let to = view
            .position_at(Point::new(rect.right, rect.bottom + buffer_px))
            .unwrap_or(end);
        Self::new(from, to.max(from))
    }

    /// Both edges moved by at most `tolerance` positions.
    pub fn is_near(&self, other: &ViewportWindow, tolerance: usize) -> bool {
        self.from.abs_diff(other.from) <= tolerance && self.to.abs_diff(other.to) <= tolerance
    }
}

/// Index range of `ranges` (sorted by start) that intersects `window`.
///
/// Equivalent to filtering on `to >= window.from && from <= window.to`.
pub fn visible_span(ranges: &[MatchRange], window: ViewportWindow) -> Range<usize> {
    let lower = ranges.partition_point(|range| range.position.to < window.from);
    let upper = lower + ranges[lower..].partition_point(|range| range.position.from <= window.to);
    lower..upper
}
