//! Viewer-level errors

use std::path::PathBuf;

use super::backend::BackendError;

/// Errors surfaced to the caller of the viewer
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("{}: password rejected {attempts} times, giving up", path.display())]
    AuthenticationExhausted { path: PathBuf, attempts: u32 },

    #[error("no document is loaded")]
    NoDocument,

    #[error("no password is pending")]
    NoPendingAuthentication,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
