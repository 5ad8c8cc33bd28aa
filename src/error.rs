use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the launcher core. None of them ends the session; each one is
/// recovered where it is raised and shown as text in the current view.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("cannot read directory {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported script extension: {0}")]
    UnsupportedScriptKind(String),

    #[error("failed to start {program}: {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{reason}: {}", path.display())]
    PathResolution { path: PathBuf, reason: String },

    #[error("unknown command: {0}\nType 'help' to see the available commands")]
    UnknownCommand(String),

    #[error("item {0} does not exist")]
    InvalidItemIndex(usize),
}

impl LauncherError {
    pub(crate) fn scan(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Scan {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PathResolution {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;
