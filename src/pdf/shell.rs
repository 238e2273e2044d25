//! Presentation shell capability

use super::auth::PasswordPrompt;
use super::canvas::Canvas;
use super::error::ViewerError;

/// Whatever displays the viewer: a window, a terminal, or a test recorder.
///
/// The shell feeds user input back as [`super::Command`]s; a password
/// request is answered with `SubmitPassword` or `CancelPassword`.
pub trait Shell {
    /// Show a freshly laid out canvas
    fn present(&mut self, canvas: &Canvas);

    /// Move the vertical scroll position (fraction of total height)
    fn scroll_to(&mut self, fraction: f64);

    /// 0-based page, shown 1-based
    fn show_page_indicator(&mut self, page: usize, page_count: usize);

    fn show_zoom(&mut self, percent: u32);

    fn request_password(&mut self, prompt: &PasswordPrompt);

    fn report_error(&mut self, error: &ViewerError);

    /// The session dropped its document
    fn document_closed(&mut self) {}
}
