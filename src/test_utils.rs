//! Scripted in-memory document backend for tests

use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::pdf::{
    BackendError, Bitmap, ColorMode, DocumentBackend, OpenOutcome, PageLink, PdfDocument,
    PixelFormat, RenderSpec,
};

/// A synthetic page with configurable render failures
#[derive(Clone, Debug)]
pub struct FakePage {
    pub width_pt: f32,
    pub height_pt: f32,
    pub text: String,
    pub links: Vec<PageLink>,
    broken: bool,
    rgb_unsupported: bool,
    needs_alpha: bool,
    blank_above: Option<f32>,
}

impl FakePage {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self {
            width_pt,
            height_pt,
            text: String::new(),
            links: Vec::new(),
            broken: false,
            rgb_unsupported: false,
            needs_alpha: false,
            blank_above: None,
        }
    }

    /// Every render attempt fails
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// RGB renders fail, grayscale works
    pub fn rgb_unsupported(mut self) -> Self {
        self.rgb_unsupported = true;
        self
    }

    /// Opaque RGB renders fail, RGBA works
    pub fn needs_alpha(mut self) -> Self {
        self.needs_alpha = true;
        self
    }

    /// Renders above `scale` return an empty bitmap
    pub fn blank_above(mut self, scale: f32) -> Self {
        self.blank_above = Some(scale);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_link(mut self, link: PageLink) -> Self {
        self.links.push(link);
        self
    }
}

/// In-memory document. Counters are shared between clones so a backend can
/// hand out copies and tests can still observe the calls.
#[derive(Clone, Debug)]
pub struct FakeDocument {
    pages: Vec<FakePage>,
    password: Option<String>,
    authenticated: bool,
    page_count_fails: bool,
    render_calls: Rc<Cell<usize>>,
    auth_calls: Rc<Cell<usize>>,
}

impl FakeDocument {
    pub fn with_pages(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            password: None,
            authenticated: true,
            page_count_fails: false,
            render_calls: Rc::new(Cell::new(0)),
            auth_calls: Rc::new(Cell::new(0)),
        }
    }

    /// `count` identical letter-sized pages
    pub fn uniform(count: usize, width_pt: f32, height_pt: f32) -> Self {
        Self::with_pages(vec![FakePage::new(width_pt, height_pt); count])
    }

    pub fn encrypted(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self.authenticated = false;
        self
    }

    /// Page count becomes unreadable (after authentication, if encrypted)
    pub fn unreadable_page_count(mut self) -> Self {
        self.page_count_fails = true;
        self
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls.get()
    }

    pub fn reset_render_calls(&self) {
        self.render_calls.set(0);
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.get()
    }

    fn page(&self, page: usize) -> Result<&FakePage, BackendError> {
        if !self.authenticated {
            return Err(BackendError::generic("document is locked"));
        }
        self.pages.get(page).ok_or(BackendError::PageOutOfRange {
            page,
            page_count: self.pages.len(),
        })
    }
}

impl PdfDocument for FakeDocument {
    fn authenticate(&mut self, passphrase: &str) -> Result<bool, BackendError> {
        self.auth_calls.set(self.auth_calls.get() + 1);
        let ok = self.password.as_deref().is_none_or(|p| p == passphrase);
        if ok {
            self.authenticated = true;
        }
        Ok(ok)
    }

    fn page_count(&self) -> Result<usize, BackendError> {
        if !self.authenticated {
            return Err(BackendError::generic("document is locked"));
        }
        if self.page_count_fails {
            return Err(BackendError::generic("corrupt page tree"));
        }
        Ok(self.pages.len())
    }

    fn render(&self, page: usize, spec: &RenderSpec) -> Result<Bitmap, BackendError> {
        self.render_calls.set(self.render_calls.get() + 1);
        let fake = self.page(page)?;

        if fake.broken {
            return Err(BackendError::generic("corrupt content stream"));
        }
        if fake.rgb_unsupported && spec.color == ColorMode::Rgb {
            return Err(BackendError::generic("unsupported colorspace"));
        }
        if fake.needs_alpha && spec.color == ColorMode::Rgb && !spec.alpha {
            return Err(BackendError::generic("transparency group needs alpha"));
        }
        if fake.blank_above.is_some_and(|limit| spec.scale > limit) {
            return Ok(Bitmap::new(0, 0, PixelFormat::Rgb8, Vec::new()));
        }

        let format = match (spec.color, spec.alpha) {
            (ColorMode::Gray, _) => PixelFormat::Gray8,
            (ColorMode::Rgb, false) => PixelFormat::Rgb8,
            (ColorMode::Rgb, true) => PixelFormat::Rgba8,
        };
        let width = (fake.width_pt * spec.scale).round() as u32;
        let height = (fake.height_pt * spec.scale).round() as u32;
        Ok(Bitmap::blank(width, height, format))
    }

    fn extract_text(&self, page: usize) -> Result<String, BackendError> {
        Ok(self.page(page)?.text.clone())
    }

    fn extract_links(&self, page: usize) -> Result<Vec<PageLink>, BackendError> {
        Ok(self.page(page)?.links.clone())
    }
}

/// Backend serving [`FakeDocument`]s by path
#[derive(Clone, Debug, Default)]
pub struct FakeBackend {
    docs: HashMap<PathBuf, FakeDocument>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl Into<PathBuf>, doc: FakeDocument) -> Self {
        self.docs.insert(path.into(), doc);
        self
    }

    pub fn document(&self, path: impl AsRef<Path>) -> Option<&FakeDocument> {
        self.docs.get(path.as_ref())
    }
}

impl DocumentBackend for FakeBackend {
    type Document = FakeDocument;

    fn open(&self, path: &Path) -> Result<OpenOutcome<FakeDocument>, BackendError> {
        let doc = self.docs.get(path).cloned().ok_or_else(|| {
            BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            ))
        })?;

        if doc.password.is_some() {
            Ok(OpenOutcome::EncryptionRequired(doc))
        } else {
            Ok(OpenOutcome::Ready(doc))
        }
    }
}

/// Shell that records everything the viewer tells it
#[derive(Debug, Default)]
pub struct RecordingShell {
    pub canvases: Vec<crate::pdf::Canvas>,
    pub scrolls: Vec<f64>,
    pub page_indicators: Vec<(usize, usize)>,
    pub zoom_indicators: Vec<u32>,
    pub password_prompts: Vec<crate::pdf::PasswordPrompt>,
    pub errors: Vec<String>,
    pub closed: usize,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_canvas(&self) -> Option<&crate::pdf::Canvas> {
        self.canvases.last()
    }

    pub fn last_page_indicator(&self) -> Option<usize> {
        self.page_indicators.last().map(|&(page, _)| page)
    }
}

impl crate::pdf::Shell for RecordingShell {
    fn present(&mut self, canvas: &crate::pdf::Canvas) {
        self.canvases.push(canvas.clone());
    }

    fn scroll_to(&mut self, fraction: f64) {
        self.scrolls.push(fraction);
    }

    fn show_page_indicator(&mut self, page: usize, page_count: usize) {
        self.page_indicators.push((page, page_count));
    }

    fn show_zoom(&mut self, percent: u32) {
        self.zoom_indicators.push(percent);
    }

    fn request_password(&mut self, prompt: &crate::pdf::PasswordPrompt) {
        self.password_prompts.push(prompt.clone());
    }

    fn report_error(&mut self, error: &crate::pdf::ViewerError) {
        self.errors.push(error.to_string());
    }

    fn document_closed(&mut self) {
        self.closed += 1;
    }
}
