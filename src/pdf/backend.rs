//! Document source capability consumed by the viewer core

use std::path::Path;

use super::types::{Bitmap, PageLink};

/// Colorspace requested from the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Gray,
}

/// Parameters for a single page raster
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSpec {
    /// Pixels per point
    pub scale: f32,
    pub color: ColorMode,
    pub alpha: bool,
}

/// Errors from document backends
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("{detail}")]
    Generic { detail: String },
}

impl BackendError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Result of opening a file
pub enum OpenOutcome<D> {
    /// Document is readable as-is
    Ready(D),
    /// Document is encrypted; the handle must be authenticated before use
    EncryptionRequired(D),
}

/// Opens documents. One backend value may serve many sessions; each opened
/// document is owned by exactly one of them.
pub trait DocumentBackend {
    type Document: PdfDocument;

    fn open(&self, path: &Path) -> Result<OpenOutcome<Self::Document>, BackendError>;
}

/// An opened document. Dropping the handle closes it.
pub trait PdfDocument {
    /// Try a passphrase. `Ok(false)` means the passphrase was rejected.
    fn authenticate(&mut self, passphrase: &str) -> Result<bool, BackendError>;

    fn page_count(&self) -> Result<usize, BackendError>;

    fn render(&self, page: usize, spec: &RenderSpec) -> Result<Bitmap, BackendError>;

    fn extract_text(&self, page: usize) -> Result<String, BackendError>;

    fn extract_links(&self, page: usize) -> Result<Vec<PageLink>, BackendError>;
}
