//! Composited canvas handed to the presentation shell

use std::sync::Arc;

use image::RgbImage;
use rayon::prelude::*;

use super::cache::RenderCache;
use super::layout::Layout;
use super::render::RenderedPage;
use super::{CAPTION_OFFSET, SEPARATOR_OFFSET};

const BACKGROUND_RGB: [u8; 3] = [0xF0, 0xF0, 0xF0];
const SEPARATOR_RGB: [u8; 3] = [0xCC, 0xCC, 0xCC];

/// One page bitmap at its canvas position
#[derive(Clone, Debug)]
pub struct PlacedPage {
    pub page: usize,
    pub x: u32,
    pub y: u32,
    pub rendered: Arc<RenderedPage>,
    /// "Page N", drawn centered at `caption_y`
    pub caption: String,
    pub caption_y: u32,
    /// Horizontal rule under the page; absent after the last page
    pub separator_y: Option<u32>,
}

impl PlacedPage {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.rendered.bitmap.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.rendered.bitmap.height
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width() && y >= self.y && y < self.y + self.height()
    }
}

/// Positioned bitmaps plus the scrollable extent
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    pub viewport_width: u32,
    pub width: u32,
    pub height: u32,
    pub pages: Vec<PlacedPage>,
}

impl Canvas {
    /// Place every laid-out page, centered horizontally in the viewport.
    /// Entries whose bitmap is no longer cached are left out.
    #[must_use]
    pub fn compose(layout: &Layout, cache: &RenderCache, viewport_width: u32) -> Self {
        let last_page = layout.page_count.saturating_sub(1);
        let pages = layout
            .entries
            .iter()
            .filter_map(|entry| {
                let rendered = cache.get(entry.page)?.rendered()?;
                Some(PlacedPage {
                    page: entry.page,
                    x: viewport_width.saturating_sub(entry.width) / 2,
                    y: entry.offset,
                    rendered,
                    caption: format!("Page {}", entry.page + 1),
                    caption_y: entry.bottom() + CAPTION_OFFSET,
                    separator_y: (entry.page < last_page)
                        .then(|| entry.bottom() + SEPARATOR_OFFSET),
                })
            })
            .collect();

        Self {
            viewport_width,
            width: layout.total_width.max(viewport_width),
            height: layout.total_height,
            pages,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page bitmap under a canvas point
    #[must_use]
    pub fn page_at_point(&self, x: u32, y: u32) -> Option<&PlacedPage> {
        self.pages.iter().find(|placed| placed.contains(x, y))
    }

    /// Canvas point to `(page, x, y)` in page coordinates (points)
    #[must_use]
    pub fn to_page_coords(&self, x: u32, y: u32) -> Option<(usize, f32, f32)> {
        let placed = self.page_at_point(x, y)?;
        let scale = placed.rendered.scale;
        if scale <= 0.0 {
            return None;
        }
        let px = (x - placed.x) as f32 / scale;
        let py = (y - placed.y) as f32 / scale;
        Some((placed.page, px, py))
    }

    /// Composite the strip into one RGB image. Captions are left to the
    /// shell; separators and page bitmaps are drawn. Rows are filled in
    /// parallel.
    #[must_use]
    pub fn rasterize(&self) -> Option<RgbImage> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let width = self.width as usize;
        let row_bytes = width * 3;
        let mut buf = vec![0u8; row_bytes * self.height as usize];

        buf.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let y = y as u32;
                let fill = if self.pages.iter().any(|p| p.separator_y == Some(y)) {
                    SEPARATOR_RGB
                } else {
                    BACKGROUND_RGB
                };
                for px in row.chunks_exact_mut(3) {
                    px.copy_from_slice(&fill);
                }

                for placed in &self.pages {
                    if y < placed.y || y >= placed.y + placed.height() {
                        continue;
                    }
                    let bitmap = &placed.rendered.bitmap;
                    let src_y = y - placed.y;
                    let visible = bitmap.width.min(self.width.saturating_sub(placed.x));
                    for src_x in 0..visible {
                        let dst = (placed.x + src_x) as usize * 3;
                        row[dst..dst + 3].copy_from_slice(&bitmap.rgb_at(src_x, src_y));
                    }
                }
            });

        RgbImage::from_raw(self.width, self.height, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::layout_document;
    use crate::test_utils::{FakeDocument, FakePage};

    fn composed(doc: &FakeDocument, viewport_width: u32) -> Canvas {
        let page_count = 3;
        let mut cache = RenderCache::new(page_count);
        let layout = layout_document(doc, &mut cache, page_count, viewport_width, 1.0);
        Canvas::compose(&layout, &cache, viewport_width)
    }

    #[test]
    fn pages_are_centered_with_captions() {
        let doc = FakeDocument::uniform(3, 200.0, 100.0);
        let canvas = composed(&doc, 800);

        assert_eq!(canvas.pages.len(), 3);
        let first = &canvas.pages[0];
        assert_eq!(first.x, 300);
        assert_eq!(first.y, 10);
        assert_eq!(first.caption, "Page 1");
        assert_eq!(first.caption_y, 10 + 100 + 15);
        assert_eq!(first.separator_y, Some(10 + 100 + 5));
        assert_eq!(canvas.pages[2].separator_y, None);
        assert_eq!(canvas.width, 800);
    }

    #[test]
    fn wide_pages_widen_the_extent() {
        let doc = FakeDocument::uniform(3, 1000.0, 100.0);
        let canvas = composed(&doc, 800);

        assert_eq!(canvas.width, 1000);
        assert_eq!(canvas.pages[0].x, 0);
    }

    #[test]
    fn point_maps_back_to_page_coordinates() {
        let doc = FakeDocument::with_pages(vec![
            FakePage::new(200.0, 100.0),
            FakePage::new(200.0, 100.0).broken(),
            FakePage::new(200.0, 100.0),
        ]);
        let canvas = composed(&doc, 800);

        // Second placed page is document page 2 at y = 10 + 100 + 30.
        assert_eq!(canvas.to_page_coords(310, 150), Some((2, 10.0, 10.0)));
        assert!(canvas.to_page_coords(10, 150).is_none());
        assert!(canvas.to_page_coords(310, 125).is_none());
    }

    #[test]
    fn rasterize_draws_pages_and_separators() {
        let doc = FakeDocument::uniform(3, 200.0, 100.0);
        let canvas = composed(&doc, 800);
        let img = canvas.rasterize().unwrap();

        assert_eq!(img.dimensions(), (800, canvas.height));
        assert_eq!(img.get_pixel(400, 50).0, [0xFF, 0xFF, 0xFF]);
        assert_eq!(img.get_pixel(10, 50).0, BACKGROUND_RGB);
        assert_eq!(img.get_pixel(10, 115).0, SEPARATOR_RGB);
    }

    #[test]
    fn empty_canvas_does_not_rasterize() {
        let canvas = Canvas::default();
        assert!(canvas.rasterize().is_none());
    }
}
