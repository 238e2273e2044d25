//! Viewer session state management

use std::path::PathBuf;

use log::{debug, info};

use super::layout::Layout;
use super::viewport::{ScrollRange, page_at_viewport, scroll_to_page};
use super::zoom::Zoom;

/// Viewport width assumed before the shell reports a usable size
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 800;

/// Current view state for one document tab
#[derive(Clone, Debug)]
pub struct ViewerSession {
    /// Path to the loaded document
    pub doc_path: Option<PathBuf>,

    pub zoom: Zoom,

    /// Viewport size in pixels as last reported by the shell
    pub viewport_width: u32,
    pub viewport_height: u32,

    pub scroll: ScrollRange,

    /// Active page (0-indexed), a display hint
    pub current_page: usize,

    /// Total page count
    pub page_count: usize,

    /// Result of the most recent layout pass
    pub layout: Layout,

    fallback_width: u32,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_WIDTH)
    }
}

impl ViewerSession {
    /// Create an empty session. `fallback_width` stands in for a viewport
    /// that has not been sized yet.
    #[must_use]
    pub fn new(fallback_width: u32) -> Self {
        Self {
            doc_path: None,
            zoom: Zoom::default(),
            viewport_width: 0,
            viewport_height: 0,
            scroll: ScrollRange::default(),
            current_page: 0,
            page_count: 0,
            layout: Layout::default(),
            fallback_width,
        }
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        self.doc_path.is_some()
    }

    /// Width used for layout and centering
    #[must_use]
    pub fn effective_width(&self) -> u32 {
        if self.viewport_width < 2 {
            self.fallback_width
        } else {
            self.viewport_width
        }
    }

    /// A document finished loading: reset view to 100%, top of page 1
    #[must_use]
    pub fn begin_document(&mut self, path: PathBuf, page_count: usize) -> Vec<Effect> {
        info!("Viewing {} ({page_count} pages)", path.display());
        self.doc_path = Some(path);
        self.page_count = page_count;
        self.current_page = 0;
        self.zoom.reset();
        self.layout = Layout::default();
        self.scroll = ScrollRange::default();

        vec![
            Effect::InvalidateCache,
            Effect::Relayout,
            Effect::ScrollTo(0.0),
            Effect::UpdateZoomIndicator(self.zoom.percent()),
            Effect::UpdatePageIndicator(0),
        ]
    }

    /// Forget the document and everything derived from it
    pub fn clear_document(&mut self) {
        self.doc_path = None;
        self.page_count = 0;
        self.current_page = 0;
        self.layout = Layout::default();
        self.scroll = ScrollRange::default();
    }

    /// Store a finished layout pass. The scroll fraction is kept as-is and
    /// re-clamped to the new extent.
    pub fn install_layout(&mut self, layout: Layout) {
        self.scroll = ScrollRange::at(self.scroll.top, self.viewport_height, layout.total_height);
        self.layout = layout;
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Open(path) => vec![Effect::LoadDocument(path)],

            Command::SubmitPassword(passphrase) => vec![Effect::Authenticate(passphrase)],

            Command::CancelPassword => vec![Effect::CancelAuthentication],

            Command::Close => vec![Effect::CloseDocument],

            Command::SubmitZoom(text) => match text.trim().parse::<i64>() {
                Ok(percent) => {
                    let before = self.zoom;
                    self.zoom.set_percent(percent);
                    self.zoom_effects(before, true)
                }
                Err(_) => vec![Effect::RevertZoomInput(self.zoom.percent())],
            },

            Command::ZoomIn => {
                let before = self.zoom;
                self.zoom.step_in();
                self.zoom_effects(before, false)
            }

            Command::ZoomOut => {
                let before = self.zoom;
                self.zoom.step_out();
                self.zoom_effects(before, false)
            }

            Command::ResetZoom => {
                if !self.has_document() {
                    return vec![];
                }
                let before = self.zoom;
                self.zoom.reset();
                self.zoom_effects(before, false)
            }

            Command::SubmitPage(text) => {
                let Ok(requested) = text.trim().parse::<i64>() else {
                    return vec![Effect::RevertPageInput(self.current_page + 1)];
                };
                if self.page_count == 0 {
                    return vec![Effect::RevertPageInput(self.current_page + 1)];
                }
                let page = requested.clamp(1, self.page_count as i64) as usize - 1;
                self.go_to_page(page)
            }

            Command::NextPage => {
                if self.current_page + 1 < self.page_count {
                    self.go_to_page(self.current_page + 1)
                } else {
                    vec![]
                }
            }

            Command::PrevPage => {
                if self.current_page > 0 && self.page_count > 0 {
                    self.go_to_page(self.current_page - 1)
                } else {
                    vec![]
                }
            }

            Command::Scroll(range) => {
                self.scroll = range;
                if self.layout.is_empty() {
                    return vec![];
                }
                let page = page_at_viewport(range, &self.layout);
                if page != self.current_page {
                    self.current_page = page;
                    vec![Effect::UpdatePageIndicator(page)]
                } else {
                    vec![]
                }
            }

            Command::Resize { width, height } => {
                let width_changed = self.viewport_width != width;
                self.viewport_width = width;
                self.viewport_height = height;
                if width_changed && self.has_document() {
                    vec![Effect::Relayout]
                } else {
                    vec![]
                }
            }
        }
    }

    fn zoom_effects(&self, before: Zoom, echo_input: bool) -> Vec<Effect> {
        let percent = self.zoom.percent();
        if before != self.zoom {
            debug!("Zoom {}% -> {percent}%", before.percent());
            vec![
                Effect::InvalidateCache,
                Effect::Relayout,
                Effect::UpdateZoomIndicator(percent),
            ]
        } else if echo_input {
            vec![Effect::UpdateZoomIndicator(percent)]
        } else {
            vec![]
        }
    }

    fn go_to_page(&mut self, page: usize) -> Vec<Effect> {
        self.current_page = page;
        let mut effects = vec![Effect::UpdatePageIndicator(page)];
        if let Some(fraction) = scroll_to_page(page, &self.layout, self.viewport_height) {
            self.scroll = ScrollRange::at(fraction, self.viewport_height, self.layout.total_height);
            effects.push(Effect::ScrollTo(fraction));
        }
        effects
    }
}

/// Commands that modify viewer state. Shell callbacks translate user input
/// into these.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Load a document, replacing the current one on success
    Open(PathBuf),
    /// Answer to a password prompt
    SubmitPassword(String),
    /// Dismiss the password prompt
    CancelPassword,
    /// Zoom percent typed into the toolbar
    SubmitZoom(String),
    /// 1-based page number typed into the toolbar
    SubmitPage(String),
    ZoomIn,
    ZoomOut,
    /// Back to 100%
    ResetZoom,
    NextPage,
    PrevPage,
    /// Visible window changed
    Scroll(ScrollRange),
    /// Viewport resized (pixels)
    Resize { width: u32, height: u32 },
    /// Close the document
    Close,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Drop every cached bitmap
    InvalidateCache,
    /// Run a full layout pass and present it
    Relayout,
    /// Move the scroll position (fraction of total height)
    ScrollTo(f64),
    UpdatePageIndicator(usize),
    UpdateZoomIndicator(u32),
    /// Zoom input was not a number; show this percent again
    RevertZoomInput(u32),
    /// Page input was not usable; show this 1-based page again
    RevertPageInput(usize),
    LoadDocument(PathBuf),
    Authenticate(String),
    CancelAuthentication,
    CloseDocument,
}
