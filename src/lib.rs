// Export modules for use in tests
pub mod cli;
pub mod panic_handler;
pub mod pdf;
pub mod settings;
pub mod workspace;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use pdf::{Command, Shell, ViewerConfig, ViewerError, ViewerService};
pub use workspace::{Tab, Workspace};
