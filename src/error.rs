//! Error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::codec::DecodeError;

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A failure confined to a single entry or record.
///
/// None of these abort an archive run: the entry is skipped, logged and
/// recorded in the operation's report.
#[derive(Error, Debug)]
pub enum EntryError {
    /// Source file could not be read while archiving
    #[error("failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Record header is missing its framing
    #[error("malformed record '{header}': {reason}")]
    MalformedRecord { header: String, reason: &'static str },

    /// Digit string of a record is not valid
    #[error("malformed encoding for '{path}': {source}")]
    MalformedEncoding {
        path: String,
        #[source]
        source: DecodeError,
    },

    /// Path is absolute or climbs out of the destination root
    #[error("path escapes destination root: '{path}'")]
    PathEscape { path: String },

    /// Path cannot be used as an entry name
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A second entry resolved to an already archived path
    #[error("duplicate path: '{path}'")]
    DuplicatePath { path: String },

    /// Extracted file could not be written
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EntryError {
    /// The entry path (or raw header) this error refers to.
    pub fn subject(&self) -> String {
        match self {
            Self::ReadFailure { path, .. } | Self::WriteFailure { path, .. } => {
                path.display().to_string()
            }
            Self::MalformedRecord { header, .. } => header.clone(),
            Self::MalformedEncoding { path, .. }
            | Self::PathEscape { path }
            | Self::InvalidPath { path, .. }
            | Self::DuplicatePath { path } => path.clone(),
        }
    }
}

/// Errors returned by archive operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Stream-level I/O failure (input or output could not be used)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Walk root is missing or not a directory
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Failure of a single entry
    #[error(transparent)]
    Entry(#[from] EntryError),
}

impl Error {
    /// Returns `true` if processing can continue past this error.
    ///
    /// ```
    /// use digitar::{EntryError, Error};
    ///
    /// let err = Error::from(EntryError::PathEscape { path: "../etc/passwd".into() });
    /// assert!(err.is_recoverable());
    ///
    /// let err = Error::from(std::io::Error::other("disk gone"));
    /// assert!(!err.is_recoverable());
    /// ```
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Entry(_))
    }
}
