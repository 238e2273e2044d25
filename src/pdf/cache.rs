//! Per-page render cache for the current zoom level

use std::sync::Arc;

use super::backend::PdfDocument;
use super::render::{RenderedPage, render_with_fallback};

#[derive(Clone, Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Rendered(Arc<RenderedPage>),
    Failed,
}

/// Outcome remembered for an attempted page
#[derive(Clone, Debug)]
pub enum CachedPage {
    Rendered(Arc<RenderedPage>),
    Failed,
}

impl CachedPage {
    #[must_use]
    pub fn rendered(self) -> Option<Arc<RenderedPage>> {
        match self {
            Self::Rendered(data) => Some(data),
            Self::Failed => None,
        }
    }
}

/// Arena of rendered pages indexed by page number.
///
/// Holds results for a single zoom factor. Every invalidation bumps the
/// generation; results tagged with an older generation are refused so a
/// stale bitmap can never be placed into a newer layout.
#[derive(Debug)]
pub struct RenderCache {
    slots: Vec<Slot>,
    zoom: f32,
    generation: u64,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RenderCache {
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        Self {
            slots: vec![Slot::Empty; page_count],
            zoom: 1.0,
            generation: 0,
        }
    }

    /// Drop everything and size the arena for a new document
    pub fn reset(&mut self, page_count: usize) {
        self.slots.clear();
        self.slots.resize(page_count, Slot::Empty);
        self.generation += 1;
    }

    /// Clear all cached pages
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.generation += 1;
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    /// Make the cache valid for `zoom`. Returns true if it had to be cleared.
    pub fn ensure_zoom(&mut self, zoom: f32) -> bool {
        if (self.zoom - zoom).abs() > f32::EPSILON {
            self.zoom = zoom;
            self.invalidate_all();
            true
        } else {
            false
        }
    }

    /// Cached result for a page, `None` if the page has not been attempted
    #[must_use]
    pub fn get(&self, page: usize) -> Option<CachedPage> {
        match self.slots.get(page)? {
            Slot::Empty => None,
            Slot::Rendered(data) => Some(CachedPage::Rendered(Arc::clone(data))),
            Slot::Failed => Some(CachedPage::Failed),
        }
    }

    /// Store a result produced under `generation`. Returns false, and keeps
    /// the slot untouched, if the cache has been invalidated since.
    pub fn store(
        &mut self,
        generation: u64,
        page: usize,
        result: Option<RenderedPage>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        let Some(slot) = self.slots.get_mut(page) else {
            return false;
        };
        *slot = match result {
            Some(data) => Slot::Rendered(Arc::new(data)),
            None => Slot::Failed,
        };
        true
    }

    /// Cached page, rendering it on first request. Failures are remembered
    /// so a pass never retries the same page.
    pub fn get_or_render<D: PdfDocument + ?Sized>(
        &mut self,
        doc: &D,
        page: usize,
        high_dpi_scale: f32,
    ) -> Option<Arc<RenderedPage>> {
        if let Some(cached) = self.get(page) {
            return cached.rendered();
        }

        let generation = self.generation;
        let result = render_with_fallback(doc, page, self.zoom, high_dpi_scale).ok();
        self.store(generation, page, result);
        self.get(page).and_then(CachedPage::rendered)
    }

    /// Number of pages with a successful render
    #[must_use]
    pub fn rendered_len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Rendered(_)))
            .count()
    }

    /// Check if nothing has been attempted yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| matches!(slot, Slot::Empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeDocument, FakePage};

    #[test]
    fn renders_each_page_once() {
        let doc = FakeDocument::uniform(3, 100.0, 100.0);
        let mut cache = RenderCache::new(3);

        for _ in 0..2 {
            for page in 0..3 {
                assert!(cache.get_or_render(&doc, page, 2.0).is_some());
            }
        }

        assert_eq!(doc.render_calls(), 3);
        assert_eq!(cache.rendered_len(), 3);
    }

    #[test]
    fn failed_page_is_not_retried() {
        let doc = FakeDocument::with_pages(vec![FakePage::new(10.0, 10.0).broken()]);
        let mut cache = RenderCache::new(1);

        assert!(cache.get_or_render(&doc, 0, 2.0).is_none());
        assert!(cache.get_or_render(&doc, 0, 2.0).is_none());

        assert_eq!(doc.render_calls(), 4);
        assert!(matches!(cache.get(0), Some(CachedPage::Failed)));
    }

    #[test]
    fn zoom_change_invalidates() {
        let doc = FakeDocument::uniform(2, 100.0, 100.0);
        let mut cache = RenderCache::new(2);
        cache.get_or_render(&doc, 0, 2.0);
        cache.get_or_render(&doc, 1, 2.0);

        assert!(!cache.ensure_zoom(1.0));
        assert_eq!(cache.rendered_len(), 2);

        assert!(cache.ensure_zoom(1.2));
        assert!(cache.is_empty());
        assert_eq!(cache.zoom(), 1.2);
    }

    #[test]
    fn stale_generation_is_rejected() {
        let doc = FakeDocument::uniform(1, 100.0, 100.0);
        let mut cache = RenderCache::new(1);
        let generation = cache.generation();
        let result = render_with_fallback(&doc, 0, 1.0, 2.0).ok();

        cache.invalidate_all();

        assert!(!cache.store(generation, 0, result));
        assert!(cache.get(0).is_none());
    }

    #[test]
    fn reset_resizes_arena() {
        let mut cache = RenderCache::new(2);
        let before = cache.generation();
        cache.reset(5);

        assert_eq!(cache.page_count(), 5);
        assert!(cache.generation() > before);
        assert!(cache.get(4).is_none());
        assert!(cache.get(5).is_none());
    }
}
