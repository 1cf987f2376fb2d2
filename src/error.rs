use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied argument out of range. Raised before any I/O.
    #[error("invalid argument: {0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    /// Reply could not be decoded into a status.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Reply carried an `<error>` element; text is verbatim.
    #[error("STR4500 returned error: {0}")]
    Device(String),

    #[error("reading scenario index {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("scenario index line {line}: {reason}")]
    ScenarioIndex { line: usize, reason: String },
}

impl Error {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }
}
