use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// A numeric priority outside of the severity table.
    #[error("invalid severity index {0}")]
    InvalidSeverity(u8),

    /// Update or close of a project that isn't live.
    #[error("no live project named {0:?}")]
    NotFound(String),

    /// A second `request_line` while one is still waiting.
    #[error("an input prompt is already active")]
    ConcurrentInputConflict,

    #[error("input request was cancelled")]
    InputCancelled,

    /// Writing to the terminal stream failed.
    #[error("terminal write failed")]
    Terminal(#[source] io::Error),

    /// Writing to the backing log file failed.
    #[error("failed to persist log lines to {}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
