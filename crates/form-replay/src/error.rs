//! Error handling for the form-replay crate.

use std::{io, path::PathBuf, result};

use thiserror::Error;

/// Convenient result type for form-replay operations.
pub type Result<T> = result::Result<T, Error>;

/// Errors that can occur while replaying a session.
#[derive(Debug, Error)]
pub enum Error {
    /// The form declaration failed to load.
    #[error("{}", .0.pretty())]
    Config(#[from] form_config::Error),
    /// The script file could not be read.
    #[error("reading {}: {source}", path.display())]
    ReadScript {
        /// Script path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The script is not a valid step list.
    #[error("parsing {}: {source}", path.display())]
    ParseScript {
        /// Script path.
        path: PathBuf,
        /// Decoder error.
        source: serde_json::Error,
    },
    /// Writing the transcript failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
