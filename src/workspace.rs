//! Tabbed workspace hosting independent viewer sessions

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::pdf::{Command, DocumentBackend, Shell, ViewerConfig, ViewerError, ViewerService};

/// One open document
pub struct Tab<B: DocumentBackend> {
    pub title: String,
    pub path: PathBuf,
    pub viewer: ViewerService<B>,
}

/// Ordered tabs with at most one active. Each tab owns its own session,
/// cache and password flow.
pub struct Workspace<B: DocumentBackend + Clone> {
    backend: B,
    config: ViewerConfig,
    tabs: Vec<Tab<B>>,
    active: Option<usize>,
}

fn tab_title(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl<B: DocumentBackend + Clone> Workspace<B> {
    #[must_use]
    pub fn new(backend: B, config: ViewerConfig) -> Self {
        Self {
            backend,
            config,
            tabs: Vec::new(),
            active: None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    #[must_use]
    pub fn active(&self) -> Option<&Tab<B>> {
        self.active.and_then(|idx| self.tabs.get(idx))
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab<B>> {
        self.active.and_then(|idx| self.tabs.get_mut(idx))
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.tabs.iter().map(|tab| tab.title.as_str())
    }

    /// Open `path` in a new tab and focus it. A file that fails to open
    /// gets no tab; an encrypted one gets a tab waiting for its password.
    pub fn open_tab(
        &mut self,
        path: impl Into<PathBuf>,
        shell: &mut dyn Shell,
    ) -> Result<usize, ViewerError> {
        let path = path.into();
        let mut viewer = ViewerService::with_config(self.backend.clone(), self.config);
        viewer.dispatch(Command::Open(path.clone()), shell)?;

        let title = tab_title(&path);
        info!("New tab '{title}'");
        self.tabs.push(Tab {
            title,
            path,
            viewer,
        });
        let idx = self.tabs.len() - 1;
        self.active = Some(idx);
        Ok(idx)
    }

    /// Focus tab `idx`
    pub fn select(&mut self, idx: usize) -> bool {
        if idx < self.tabs.len() {
            self.active = Some(idx);
            true
        } else {
            false
        }
    }

    /// Remove tab `idx`, dropping its document. Focus moves to the tab that
    /// slides into its place, or the new last tab.
    pub fn close_tab(&mut self, idx: usize) -> bool {
        if idx >= self.tabs.len() {
            return false;
        }
        let tab = self.tabs.remove(idx);
        debug!("Closed tab '{}'", tab.title);

        self.active = match self.active {
            _ if self.tabs.is_empty() => None,
            Some(active) if active > idx => Some(active - 1),
            Some(active) => Some(active.min(self.tabs.len() - 1)),
            None => None,
        };
        true
    }

    /// Send a command to the active tab. A tab whose document never became
    /// usable (password cancelled or attempts exhausted) is closed.
    pub fn dispatch(&mut self, cmd: Command, shell: &mut dyn Shell) -> Result<(), ViewerError> {
        let Some(idx) = self.active else {
            return Err(ViewerError::NoDocument);
        };
        let tab = &mut self.tabs[idx];
        let result = tab.viewer.dispatch(cmd, shell);

        if !tab.viewer.has_document() && !tab.viewer.is_awaiting_password() {
            self.close_tab(idx);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeBackend, FakeDocument, RecordingShell};

    fn workspace() -> Workspace<FakeBackend> {
        let backend = FakeBackend::new()
            .with_document("/docs/a.pdf", FakeDocument::uniform(2, 100.0, 100.0))
            .with_document("/docs/b.pdf", FakeDocument::uniform(5, 100.0, 100.0))
            .with_document(
                "/docs/locked.pdf",
                FakeDocument::uniform(1, 100.0, 100.0).encrypted("pw"),
            );
        Workspace::new(backend, ViewerConfig::default())
    }

    #[test]
    fn tabs_are_independent() {
        let mut ws = workspace();
        let mut shell = RecordingShell::new();
        ws.open_tab("/docs/a.pdf", &mut shell).unwrap();
        ws.dispatch(Command::ZoomIn, &mut shell).unwrap();
        ws.open_tab("/docs/b.pdf", &mut shell).unwrap();

        assert_eq!(ws.len(), 2);
        assert_eq!(ws.titles().collect::<Vec<_>>(), vec!["a.pdf", "b.pdf"]);
        assert_eq!(ws.active().unwrap().viewer.session().zoom.percent(), 100);

        assert!(ws.select(0));
        let active = ws.active().unwrap();
        assert_eq!(active.viewer.session().zoom.percent(), 120);
        assert_eq!(active.viewer.session().page_count, 2);
    }

    #[test]
    fn failed_open_adds_no_tab() {
        let mut ws = workspace();
        let mut shell = RecordingShell::new();
        assert!(ws.open_tab("/docs/missing.pdf", &mut shell).is_err());
        assert!(ws.is_empty());
        assert_eq!(ws.active_index(), None);
    }

    #[test]
    fn cancelled_password_closes_its_tab() {
        let mut ws = workspace();
        let mut shell = RecordingShell::new();
        ws.open_tab("/docs/a.pdf", &mut shell).unwrap();
        ws.open_tab("/docs/locked.pdf", &mut shell).unwrap();
        assert_eq!(ws.len(), 2);

        ws.dispatch(Command::CancelPassword, &mut shell).unwrap();
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.active().unwrap().title, "a.pdf");
    }

    #[test]
    fn closing_tabs_moves_focus() {
        let mut ws = workspace();
        let mut shell = RecordingShell::new();
        ws.open_tab("/docs/a.pdf", &mut shell).unwrap();
        ws.open_tab("/docs/b.pdf", &mut shell).unwrap();
        ws.select(0);

        assert!(ws.close_tab(1));
        assert_eq!(ws.active_index(), Some(0));
        assert!(ws.close_tab(0));
        assert_eq!(ws.active_index(), None);
        assert!(!ws.close_tab(0));
        assert!(matches!(
            ws.dispatch(Command::NextPage, &mut shell),
            Err(ViewerError::NoDocument)
        ));
    }
}
