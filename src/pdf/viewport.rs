//! Mapping between scroll position and the active page

use super::layout::Layout;

/// Visible window of the canvas as fractions of the total content height
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRange {
    pub top: f64,
    pub bottom: f64,
}

impl Default for ScrollRange {
    fn default() -> Self {
        Self {
            top: 0.0,
            bottom: 1.0,
        }
    }
}

impl ScrollRange {
    /// Non-finite bounds fall back to the full document.
    #[must_use]
    pub fn new(top: f64, bottom: f64) -> Self {
        let top = if top.is_finite() { top } else { 0.0 };
        let bottom = if bottom.is_finite() { bottom } else { 1.0 };
        let top = top.clamp(0.0, 1.0);
        Self {
            top,
            bottom: bottom.clamp(top, 1.0),
        }
    }

    /// Window starting at `top` for a viewport of `viewport_height` pixels,
    /// clamped the way a scrollable canvas clamps its view.
    #[must_use]
    pub fn at(top: f64, viewport_height: u32, total_height: u32) -> Self {
        if total_height == 0 {
            return Self::default();
        }
        let visible = (f64::from(viewport_height) / f64::from(total_height)).min(1.0);
        let top = if top.is_finite() { top } else { 0.0 };
        let top = top.clamp(0.0, 1.0 - visible);
        Self {
            top,
            bottom: top + visible,
        }
    }

    /// Center of the window in canvas pixels
    #[must_use]
    pub fn center_px(&self, total_height: u32) -> f64 {
        (self.top + self.bottom) / 2.0 * f64::from(total_height)
    }
}

/// Page whose top edge is the last one at or above the viewport center.
/// Falls back to page 0 when no page has scrolled past the center.
#[must_use]
pub fn page_at_viewport(range: ScrollRange, layout: &Layout) -> usize {
    let center = range.center_px(layout.total_height);
    let placed_above = layout
        .entries
        .partition_point(|entry| f64::from(entry.offset) <= center);

    placed_above
        .checked_sub(1)
        .map_or(0, |idx| layout.entries[idx].page)
}

/// Scroll fraction that puts `page` at the top of the viewport.
///
/// `None` means no scroll change: the page is not in the layout, or the
/// content already fits in the viewport.
#[must_use]
pub fn scroll_to_page(page: usize, layout: &Layout, viewport_height: u32) -> Option<f64> {
    if layout.total_height <= viewport_height {
        return None;
    }
    let entry = layout.entry(page)?;
    let fraction = f64::from(entry.offset) / f64::from(layout.total_height);
    Some(fraction.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Three 1000px pages: offsets 10, 1040, 2070; total 3100.
    fn tall_layout() -> Layout {
        Layout::stack([(0, 600, 1000), (1, 600, 1000), (2, 600, 1000)], 3, 800)
    }

    #[test]
    fn top_of_document_is_page_zero() {
        let layout = tall_layout();
        assert_eq!(page_at_viewport(ScrollRange::at(0.0, 600, 3100), &layout), 0);
    }

    #[test]
    fn center_before_first_offset_falls_back_to_zero() {
        let layout = Layout::stack([(1, 10, 10)], 2, 800);
        let range = ScrollRange::new(0.0, 0.0);
        assert_eq!(page_at_viewport(range, &layout), 0);
    }

    #[test]
    fn center_in_gap_reports_page_above() {
        let layout = tall_layout();
        // Gap between page 0 and 1 spans [1010, 1040).
        let total = f64::from(layout.total_height);
        let in_gap = 1020.0 / total;
        assert_eq!(page_at_viewport(ScrollRange::new(in_gap, in_gap), &layout), 0);

        let past_boundary = 1040.5 / total;
        assert_eq!(
            page_at_viewport(ScrollRange::new(past_boundary, past_boundary), &layout),
            1
        );
    }

    #[test]
    fn scrolling_down_never_decreases_page() {
        let layout = tall_layout();
        let mut last = 0;
        for step in 0..=100 {
            let top = f64::from(step) / 100.0;
            let page = page_at_viewport(ScrollRange::at(top, 600, layout.total_height), &layout);
            assert!(page >= last, "page went back from {last} to {page} at {top}");
            last = page;
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn scrolling_up_never_increases_page() {
        let layout = tall_layout();
        let mut last = 2;
        for step in (0..=100).rev() {
            let top = f64::from(step) / 100.0;
            let page = page_at_viewport(ScrollRange::at(top, 600, layout.total_height), &layout);
            assert!(page <= last, "page went forward from {last} to {page} at {top}");
            last = page;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn scroll_to_page_round_trips() {
        let layout = tall_layout();
        for page in 0..3 {
            let top = scroll_to_page(page, &layout, 600).unwrap();
            let range = ScrollRange::at(top, 600, layout.total_height);
            assert_eq!(page_at_viewport(range, &layout), page);
        }
    }

    #[test]
    fn scroll_to_page_is_noop_when_content_fits() {
        let layout = Layout::stack([(0, 100, 100)], 1, 800);
        assert_eq!(scroll_to_page(0, &layout, 600), None);
    }

    #[test]
    fn scroll_to_skipped_page_is_noop() {
        let layout = Layout::stack([(0, 600, 1000), (2, 600, 1000)], 3, 800);
        assert_eq!(scroll_to_page(1, &layout, 600), None);
        assert!(scroll_to_page(2, &layout, 600).is_some());
    }

    #[test]
    fn range_clamps_to_content() {
        let range = ScrollRange::at(0.99, 620, 3100);
        assert!((range.bottom - 1.0).abs() < 1e-9);
        assert!((range.top - 0.8).abs() < 1e-9);

        let fits = ScrollRange::at(0.5, 5000, 3100);
        assert_eq!(fits, ScrollRange::new(0.0, 1.0));
    }

    #[test]
    fn non_finite_bounds_cover_whole_document() {
        let layout = tall_layout();
        let range = ScrollRange::new(f64::NAN, 0.5);
        assert_eq!(range, ScrollRange::new(0.0, 0.5));
        assert_eq!(page_at_viewport(range, &layout), 0);

        assert_eq!(
            ScrollRange::new(0.2, f64::INFINITY),
            ScrollRange::new(0.2, 1.0)
        );
        assert_eq!(ScrollRange::at(f64::NAN, 600, 3100).top, 0.0);
    }
}
