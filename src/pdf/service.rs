//! Viewer service - owns the document, cache and auth flow, runs effects

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use super::auth::{AuthFlow, AuthOutcome, AuthState, DEFAULT_MAX_ATTEMPTS};
use super::backend::{DocumentBackend, OpenOutcome, PdfDocument};
use super::cache::RenderCache;
use super::canvas::Canvas;
use super::error::ViewerError;
use super::layout::{Layout, layout_document};
use super::links::LinkIndex;
use super::render::RenderStrategy;
use super::shell::Shell;
use super::state::{Command, DEFAULT_VIEWPORT_WIDTH, Effect, ViewerSession};
use super::types::{DocumentInfo, LinkTarget, PageLink};

/// Tunables for a viewer session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerConfig {
    /// Scale multiplier for the first render strategy
    pub high_dpi_scale: f32,
    /// Width used until the shell reports a real viewport
    pub fallback_viewport_width: u32,
    pub max_password_attempts: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            high_dpi_scale: RenderStrategy::HIGH_DPI_SCALE,
            fallback_viewport_width: DEFAULT_VIEWPORT_WIDTH,
            max_password_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Encrypted document waiting for its passphrase
struct PendingDocument<D> {
    path: PathBuf,
    doc: D,
}

/// One viewer session over a document backend.
///
/// User input enters through [`ViewerService::dispatch`]; everything the
/// user should see leaves through the [`Shell`].
pub struct ViewerService<B: DocumentBackend> {
    backend: B,
    config: ViewerConfig,
    session: ViewerSession,
    document: Option<B::Document>,
    pending: Option<PendingDocument<B::Document>>,
    encrypted: bool,
    auth: AuthFlow,
    cache: RenderCache,
    links: LinkIndex,
    canvas: Canvas,
}

impl<B: DocumentBackend> ViewerService<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ViewerConfig::default())
    }

    #[must_use]
    pub fn with_config(backend: B, config: ViewerConfig) -> Self {
        Self {
            backend,
            session: ViewerSession::new(config.fallback_viewport_width),
            auth: AuthFlow::new(config.max_password_attempts),
            config,
            document: None,
            pending: None,
            encrypted: false,
            cache: RenderCache::default(),
            links: LinkIndex::default(),
            canvas: Canvas::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.session.layout
    }

    /// Canvas from the most recent layout pass
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[must_use]
    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    #[must_use]
    pub fn auth_state(&self) -> &AuthState {
        self.auth.state()
    }

    #[must_use]
    pub fn is_awaiting_password(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    #[must_use]
    pub fn document_path(&self) -> Option<&Path> {
        self.session.doc_path.as_deref()
    }

    #[must_use]
    pub fn document_info(&self) -> Option<DocumentInfo> {
        self.document.as_ref().map(|_| DocumentInfo {
            page_count: self.session.page_count,
            encrypted: self.encrypted,
        })
    }

    /// Apply a command and carry out its effects. Errors are also reported
    /// to the shell before being returned.
    pub fn dispatch(&mut self, cmd: Command, shell: &mut dyn Shell) -> Result<(), ViewerError> {
        let effects = self.session.apply(cmd);
        self.execute_effects(effects, shell).inspect_err(|err| {
            error!("{err}");
            shell.report_error(err);
        })
    }

    fn execute_effects(
        &mut self,
        effects: Vec<Effect>,
        shell: &mut dyn Shell,
    ) -> Result<(), ViewerError> {
        for effect in effects {
            match effect {
                Effect::InvalidateCache => {
                    self.cache.invalidate_all();
                }

                Effect::Relayout => {
                    self.relayout(shell);
                }

                Effect::ScrollTo(fraction) => {
                    shell.scroll_to(fraction);
                }

                Effect::UpdatePageIndicator(page) => {
                    shell.show_page_indicator(page, self.session.page_count);
                }

                Effect::UpdateZoomIndicator(percent) | Effect::RevertZoomInput(percent) => {
                    shell.show_zoom(percent);
                }

                Effect::RevertPageInput(page) => {
                    shell.show_page_indicator(page.saturating_sub(1), self.session.page_count);
                }

                Effect::LoadDocument(path) => {
                    self.load_document(path, shell)?;
                }

                Effect::Authenticate(passphrase) => {
                    self.authenticate(&passphrase, shell)?;
                }

                Effect::CancelAuthentication => {
                    self.cancel_authentication(shell);
                }

                Effect::CloseDocument => {
                    self.close_document(shell);
                }
            }
        }
        Ok(())
    }

    fn load_document(&mut self, path: PathBuf, shell: &mut dyn Shell) -> Result<(), ViewerError> {
        info!("Opening {}", path.display());
        let outcome = self.backend.open(&path).map_err(|source| ViewerError::Open {
            path: path.clone(),
            source,
        })?;

        match outcome {
            OpenOutcome::Ready(doc) => self.install_document(path, doc, false, shell),
            OpenOutcome::EncryptionRequired(doc) => {
                info!("{} is encrypted, asking for password", path.display());
                let prompt = self.auth.begin(path.clone());
                self.pending = Some(PendingDocument { path, doc });
                shell.request_password(&prompt);
                Ok(())
            }
        }
    }

    fn authenticate(&mut self, passphrase: &str, shell: &mut dyn Shell) -> Result<(), ViewerError> {
        let Some(pending) = self.pending.as_mut() else {
            return Err(ViewerError::NoPendingAuthentication);
        };

        let accepted = match pending.doc.authenticate(passphrase) {
            Ok(accepted) => accepted,
            Err(source) => {
                let path = pending.path.clone();
                self.abandon_pending();
                return Err(ViewerError::Open { path, source });
            }
        };

        match self.auth.record(accepted) {
            Some(AuthOutcome::Authenticated) => {
                let Some(PendingDocument { path, doc }) = self.pending.take() else {
                    return Err(ViewerError::NoPendingAuthentication);
                };
                info!("Password accepted for {}", path.display());
                self.install_document(path, doc, true, shell)
            }
            Some(AuthOutcome::Retry { remaining }) => {
                debug!("Password rejected, {remaining} attempts remaining");
                shell.request_password(&self.auth.prompt(Some(remaining)));
                Ok(())
            }
            Some(AuthOutcome::Exhausted { attempts }) => {
                let path = self
                    .pending
                    .take()
                    .map(|pending| pending.path)
                    .unwrap_or_default();
                warn!("Giving up on {} after {attempts} attempts", path.display());
                if self.document.is_none() {
                    shell.document_closed();
                }
                Err(ViewerError::AuthenticationExhausted { path, attempts })
            }
            None => Err(ViewerError::NoPendingAuthentication),
        }
    }

    fn cancel_authentication(&mut self, shell: &mut dyn Shell) {
        if let Some(path) = self.auth.cancel() {
            info!("Password prompt for {} cancelled", path.display());
        }
        self.abandon_pending();
        if self.document.is_none() {
            shell.document_closed();
        }
    }

    /// Drop the pending document. The auth flow reflects whatever document
    /// is still open.
    fn abandon_pending(&mut self) {
        self.pending = None;
        if self.document.is_some() {
            self.auth.mark_authenticated();
        } else {
            self.auth.reset();
        }
    }

    fn install_document(
        &mut self,
        path: PathBuf,
        doc: B::Document,
        encrypted: bool,
        shell: &mut dyn Shell,
    ) -> Result<(), ViewerError> {
        let page_count = match doc.page_count() {
            Ok(count) => count,
            Err(source) => {
                self.abandon_pending();
                return Err(ViewerError::Open { path, source });
            }
        };

        if let Some(previous) = self.session.doc_path.as_ref() {
            info!("Closing {}", previous.display());
        }
        self.document = Some(doc);
        self.encrypted = encrypted;
        self.auth.mark_authenticated();
        self.cache.reset(page_count);
        self.links.reset(page_count);

        let effects = self.session.begin_document(path, page_count);
        self.execute_effects(effects, shell)
    }

    fn close_document(&mut self, shell: &mut dyn Shell) {
        if let Some(path) = self.session.doc_path.as_ref() {
            info!("Closing {}", path.display());
        }
        self.document = None;
        self.pending = None;
        self.encrypted = false;
        self.auth.reset();
        self.cache.reset(0);
        self.links.reset(0);
        self.session.clear_document();
        self.canvas = Canvas::default();
        shell.document_closed();
    }

    fn relayout(&mut self, shell: &mut dyn Shell) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };

        let width = self.session.effective_width();
        self.cache.ensure_zoom(self.session.zoom.factor());
        let layout = layout_document(
            doc,
            &mut self.cache,
            self.session.page_count,
            width,
            self.config.high_dpi_scale,
        );
        for entry in &layout.entries {
            self.links.ensure(doc, entry.page);
        }

        self.session.install_layout(layout);
        self.canvas = Canvas::compose(&self.session.layout, &self.cache, width);
        shell.present(&self.canvas);
    }

    /// Text of the page the viewer is on
    pub fn current_page_text(&self) -> Result<String, ViewerError> {
        let doc = self.document.as_ref().ok_or(ViewerError::NoDocument)?;
        Ok(doc.extract_text(self.session.current_page)?)
    }

    /// Text of any page
    pub fn page_text(&self, page: usize) -> Result<String, ViewerError> {
        let doc = self.document.as_ref().ok_or(ViewerError::NoDocument)?;
        Ok(doc.extract_text(page)?)
    }

    /// Links of a page, indexing it on first use
    pub fn page_links(&mut self, page: usize) -> Result<&[PageLink], ViewerError> {
        let doc = self.document.as_ref().ok_or(ViewerError::NoDocument)?;
        self.links.ensure(doc, page);
        Ok(self.links.links(page))
    }

    /// Link under a canvas point, if any
    #[must_use]
    pub fn link_at(&self, x: u32, y: u32) -> Option<&LinkTarget> {
        let (page, px, py) = self.canvas.to_page_coords(x, y)?;
        self.links.hit(page, px, py)
    }
}
