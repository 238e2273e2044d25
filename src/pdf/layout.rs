//! Continuous vertical layout of rendered pages

use log::debug;

use super::backend::PdfDocument;
use super::cache::RenderCache;
use super::{PAGE_GAP, TOP_MARGIN};

/// Placement of one rendered page in the logical canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEntry {
    pub page: usize,
    /// Top edge y-coordinate
    pub offset: u32,
    pub width: u32,
    pub height: u32,
}

impl LayoutEntry {
    /// Bottom edge of the bitmap (exclusive), gap not included
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.offset + self.height
    }
}

/// Result of a layout pass. Entries are sorted by page and by offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    pub entries: Vec<LayoutEntry>,
    pub total_height: u32,
    pub total_width: u32,
    /// Page count of the document the pass ran over
    pub page_count: usize,
}

impl Layout {
    /// Stack page sizes vertically. Pages are `(index, width, height)` in
    /// increasing index order; pages that failed to render are simply absent.
    #[must_use]
    pub fn stack<I>(pages: I, page_count: usize, viewport_width: u32) -> Self
    where
        I: IntoIterator<Item = (usize, u32, u32)>,
    {
        let mut entries = Vec::new();
        let mut running_y = TOP_MARGIN;
        let mut max_width = 0;

        for (page, width, height) in pages {
            debug_assert!(entries.last().is_none_or(|e: &LayoutEntry| e.page < page));
            entries.push(LayoutEntry {
                page,
                offset: running_y,
                width,
                height,
            });
            running_y += height + PAGE_GAP;
            max_width = max_width.max(width);
        }

        let (total_height, total_width) = if entries.is_empty() {
            (0, viewport_width)
        } else {
            (running_y, max_width)
        };

        Self {
            entries,
            total_height,
            total_width,
            page_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a page, `None` if the page was skipped
    #[must_use]
    pub fn entry(&self, page: usize) -> Option<&LayoutEntry> {
        self.entries
            .binary_search_by_key(&page, |e| e.page)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Page offsets in page order
    pub fn offsets(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|e| e.offset)
    }
}

/// Run a full layout pass: render (or reuse) every page in order and stack
/// the results. Pages that fail every render strategy are skipped.
pub fn layout_document<D: PdfDocument + ?Sized>(
    doc: &D,
    cache: &mut RenderCache,
    page_count: usize,
    viewport_width: u32,
    high_dpi_scale: f32,
) -> Layout {
    let mut sizes = Vec::with_capacity(page_count);
    for page in 0..page_count {
        if let Some(rendered) = cache.get_or_render(doc, page, high_dpi_scale) {
            sizes.push((page, rendered.bitmap.width, rendered.bitmap.height));
        }
    }

    let layout = Layout::stack(sizes, page_count, viewport_width);
    debug!(
        "Layout pass at zoom {:.2}: {}/{} pages placed, extent {}x{}",
        cache.zoom(),
        layout.entries.len(),
        page_count,
        layout.total_width,
        layout.total_height
    );
    layout
}
