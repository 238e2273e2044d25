//! MuPDF implementation of the document source

use std::path::Path;

use log::debug;
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::backend::{
    BackendError, ColorMode, DocumentBackend, OpenOutcome, PdfDocument, RenderSpec,
};
use super::types::{Bitmap, LinkTarget, PageLink, PageRect, PixelFormat};

/// Opens documents with MuPDF
#[derive(Clone, Copy, Debug, Default)]
pub struct MuPdfBackend;

impl MuPdfBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentBackend for MuPdfBackend {
    type Document = MuPdfDocument;

    fn open(&self, path: &Path) -> Result<OpenOutcome<MuPdfDocument>, BackendError> {
        if !path.is_file() {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a file: {}", path.display()),
            )));
        }

        let doc = Document::open(path.to_string_lossy().as_ref())?;
        let doc = MuPdfDocument { doc };

        if doc.doc.needs_password()? {
            debug!("{} requires a password", path.display());
            Ok(OpenOutcome::EncryptionRequired(doc))
        } else {
            Ok(OpenOutcome::Ready(doc))
        }
    }
}

/// MuPDF document handle
pub struct MuPdfDocument {
    doc: Document,
}

impl MuPdfDocument {
    fn checked_page(&self, page: usize) -> Result<mupdf::Page, BackendError> {
        let page_count = self.page_count()?;
        if page >= page_count {
            return Err(BackendError::PageOutOfRange { page, page_count });
        }
        Ok(self.doc.load_page(page as i32)?)
    }
}

impl PdfDocument for MuPdfDocument {
    fn authenticate(&mut self, passphrase: &str) -> Result<bool, BackendError> {
        Ok(self.doc.authenticate(passphrase)?)
    }

    fn page_count(&self) -> Result<usize, BackendError> {
        let count = self.doc.page_count()?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn render(&self, page: usize, spec: &RenderSpec) -> Result<Bitmap, BackendError> {
        let page = self.checked_page(page)?;
        let colorspace = match spec.color {
            ColorMode::Rgb => Colorspace::device_rgb(),
            ColorMode::Gray => Colorspace::device_gray(),
        };
        let transform = Matrix::new_scale(spec.scale, spec.scale);
        let pixmap = page.to_pixmap(&transform, &colorspace, spec.alpha, false)?;
        pixmap_to_bitmap(&pixmap)
    }

    fn extract_text(&self, page: usize) -> Result<String, BackendError> {
        let page = self.checked_page(page)?;
        Ok(page.to_text()?)
    }

    fn extract_links(&self, page: usize) -> Result<Vec<PageLink>, BackendError> {
        let page = self.checked_page(page)?;
        let links = page.links()?;

        Ok(links
            .filter_map(|link| {
                let target = if let Some(dest) = link.dest {
                    Some(LinkTarget::Internal {
                        page: dest.loc.page_number as usize,
                    })
                } else if !link.uri.is_empty() {
                    Some(LinkTarget::External {
                        uri: link.uri.clone(),
                    })
                } else {
                    None
                }?;

                let b = link.bounds;
                let rect = PageRect::new(b.x0, b.y0, b.x1, b.y1);
                if rect.is_empty() {
                    return None;
                }
                Some(PageLink { rect, target })
            })
            .collect())
    }
}

/// Copy pixmap samples into a tightly packed bitmap, dropping row padding.
fn pixmap_to_bitmap(pixmap: &Pixmap) -> Result<Bitmap, BackendError> {
    let n = pixmap.n() as usize;
    let format = match n {
        1 => PixelFormat::Gray8,
        3 => PixelFormat::Rgb8,
        4 => PixelFormat::Rgba8,
        _ => {
            return Err(BackendError::generic(format!(
                "Unsupported pixmap format: {n} channels"
            )));
        }
    };

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(BackendError::generic("Pixmap buffer size mismatch"));
    }

    let pixels = if stride == row_bytes {
        samples[..row_bytes * height].to_vec()
    } else {
        let mut out = Vec::with_capacity(row_bytes * height);
        for y in 0..height {
            let row_start = y * stride;
            out.extend_from_slice(&samples[row_start..row_start + row_bytes]);
        }
        out
    };

    Ok(Bitmap::new(width as u32, height as u32, format, pixels))
}
