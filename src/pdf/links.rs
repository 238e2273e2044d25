//! Lazily built per-page link index

use log::debug;

use super::backend::PdfDocument;
use super::types::{LinkTarget, PageLink};

/// Clickable regions for each page, extracted at most once per document
#[derive(Debug, Default)]
pub struct LinkIndex {
    pages: Vec<Option<Vec<PageLink>>>,
}

impl LinkIndex {
    #[must_use]
    pub fn new(page_count: usize) -> Self {
        Self {
            pages: vec![None; page_count],
        }
    }

    /// Forget all pages and size for a new document
    pub fn reset(&mut self, page_count: usize) {
        self.pages.clear();
        self.pages.resize(page_count, None);
    }

    /// Extract links for `page` unless already indexed. Extraction errors
    /// index the page as having no links.
    pub fn ensure<D: PdfDocument + ?Sized>(&mut self, doc: &D, page: usize) {
        let Some(slot) = self.pages.get_mut(page) else {
            return;
        };
        if slot.is_some() {
            return;
        }
        let links = doc.extract_links(page).unwrap_or_else(|e| {
            debug!("Page {page}: link extraction failed: {e}");
            Vec::new()
        });
        *slot = Some(links);
    }

    #[must_use]
    pub fn is_indexed(&self, page: usize) -> bool {
        matches!(self.pages.get(page), Some(Some(_)))
    }

    /// Links on `page`; empty if the page is not indexed
    #[must_use]
    pub fn links(&self, page: usize) -> &[PageLink] {
        self.pages
            .get(page)
            .and_then(Option::as_deref)
            .unwrap_or_default()
    }

    /// Target under a point given in page coordinates
    #[must_use]
    pub fn hit(&self, page: usize, x: f32, y: f32) -> Option<&LinkTarget> {
        self.links(page)
            .iter()
            .find(|link| link.rect.contains(x, y))
            .map(|link| &link.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PageRect;
    use crate::test_utils::{FakeDocument, FakePage};

    fn doc_with_link() -> FakeDocument {
        let link = PageLink {
            rect: PageRect::new(10.0, 10.0, 50.0, 20.0),
            target: LinkTarget::External {
                uri: "https://example.com".to_string(),
            },
        };
        FakeDocument::with_pages(vec![FakePage::new(100.0, 100.0).with_link(link)])
    }

    #[test]
    fn ensure_indexes_once() {
        let doc = doc_with_link();
        let mut index = LinkIndex::new(1);
        assert!(!index.is_indexed(0));

        index.ensure(&doc, 0);
        index.ensure(&doc, 0);

        assert!(index.is_indexed(0));
        assert_eq!(index.links(0).len(), 1);
    }

    #[test]
    fn hit_test_in_page_coordinates() {
        let doc = doc_with_link();
        let mut index = LinkIndex::new(1);
        index.ensure(&doc, 0);

        assert!(matches!(
            index.hit(0, 30.0, 15.0),
            Some(LinkTarget::External { uri }) if uri == "https://example.com"
        ));
        assert!(index.hit(0, 60.0, 15.0).is_none());
    }

    #[test]
    fn out_of_range_page_is_ignored() {
        let doc = doc_with_link();
        let mut index = LinkIndex::new(1);
        index.ensure(&doc, 3);
        assert!(index.links(3).is_empty());
    }
}
