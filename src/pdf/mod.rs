//! PDF viewing core: rendering, layout, viewport tracking, zoom and auth

mod auth;
mod backend;
mod cache;
mod canvas;
mod error;
mod layout;
mod links;
#[cfg(feature = "pdf")]
mod mupdf_backend;
mod render;
mod service;
mod shell;
mod state;
mod types;
mod viewport;
mod zoom;

/// Space above the first page (pixels)
pub const TOP_MARGIN: u32 = 10;

/// Vertical distance between consecutive pages (pixels)
pub const PAGE_GAP: u32 = 30;

/// Page caption baseline below the page bottom (pixels)
pub const CAPTION_OFFSET: u32 = 15;

/// Separator rule below the page bottom (pixels)
pub const SEPARATOR_OFFSET: u32 = 5;

pub use auth::{AuthFlow, AuthOutcome, AuthState, DEFAULT_MAX_ATTEMPTS, PasswordPrompt};
pub use backend::{
    BackendError, ColorMode, DocumentBackend, OpenOutcome, PdfDocument, RenderSpec,
};
pub use cache::{CachedPage, RenderCache};
pub use canvas::{Canvas, PlacedPage};
pub use error::ViewerError;
pub use layout::{Layout, LayoutEntry, layout_document};
pub use links::LinkIndex;
#[cfg(feature = "pdf")]
pub use mupdf_backend::{MuPdfBackend, MuPdfDocument};
pub use render::{RenderFailure, RenderStrategy, RenderedPage, render_with_fallback};
pub use service::{ViewerConfig, ViewerService};
pub use shell::Shell;
pub use state::{Command, DEFAULT_VIEWPORT_WIDTH, Effect, ViewerSession};
pub use types::*;
pub use viewport::{ScrollRange, page_at_viewport, scroll_to_page};
pub use zoom::Zoom;
