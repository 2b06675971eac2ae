//! Error types for playlist data, formats and importing

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Playlist errors
///
/// Bad list indices are reported by the engine that owns the list, as
/// `PlaybackError::OutOfRange` in `soul-playback`.
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// Content is not a recognized playlist, or the write target is unusable
    #[error("Invalid playlist format: {0}")]
    InvalidFormat(String),

    /// Path does not exist
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Path exists but could not be canonicalized
    #[error("Cannot get canonical path: {}", .0.display())]
    CannotGetCanonicalPath(PathBuf),

    /// File could not be opened
    #[error("Failed to open {}: {source}", .path.display())]
    OpenFail {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CUE sheet declares tracks out of sequence
    #[error("CUE sheet {} skips from track {expected} to {found}", .path.display())]
    CueIndexLost {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    /// CUE track index not present in the sheet
    #[error("CUE sheet {} has no track {index}", .path.display())]
    CueIndexOutOfRange { path: PathBuf, index: usize },

    /// No audio file could be found for a CUE sheet
    #[error("No data source found for CUE sheet {}", .0.display())]
    CueSourceNotFound(PathBuf),

    /// I/O failure while reading playlist content
    #[error("Read error ({context}): {source}")]
    ReadError {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while writing playlist content
    #[error("Write error ({context}): {source}")]
    WriteError {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Entry was added as a URL but does not classify as remote
    #[error("Not a URL: {0}")]
    NotUrl(String),

    /// Operation needs at least one entry
    #[error("Playlist is empty")]
    PlaylistIsEmpty,

    /// Aggregate import produced nothing usable
    #[error("No valid files found in {0}")]
    NoValidFilesFound(String),

    /// Channel type is unknown or not supported by the audio backend
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),
}

impl PlaylistError {
    /// Get the error kind (discriminant without payload)
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::PathNotFound(_) => ErrorKind::PathNotFound,
            Self::CannotGetCanonicalPath(_) => ErrorKind::CannotGetCanonicalPath,
            Self::OpenFail { .. } => ErrorKind::OpenFail,
            Self::CueIndexLost { .. } => ErrorKind::CueIndexLost,
            Self::CueIndexOutOfRange { .. } => ErrorKind::CueIndexOutOfRange,
            Self::CueSourceNotFound(_) => ErrorKind::CueSourceNotFound,
            Self::ReadError { .. } => ErrorKind::ReadError,
            Self::WriteError { .. } => ErrorKind::WriteError,
            Self::NotUrl(_) => ErrorKind::NotUrl,
            Self::PlaylistIsEmpty => ErrorKind::PlaylistIsEmpty,
            Self::NoValidFilesFound(_) => ErrorKind::NoValidFilesFound,
            Self::UnsupportedSource(_) => ErrorKind::UnsupportedSource,
        }
    }

    pub(crate) fn write_failed(context: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::WriteError {
            context: context.into(),
            source: std::io::Error::other(err.to_string()),
        }
    }
}

/// Error discriminant, cheap to copy and compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidFormat,
    PathNotFound,
    CannotGetCanonicalPath,
    OpenFail,
    CueIndexLost,
    CueIndexOutOfRange,
    CueSourceNotFound,
    ReadError,
    WriteError,
    NotUrl,
    PlaylistIsEmpty,
    NoValidFilesFound,
    UnsupportedSource,
}

/// Most recent failure recorded by an aggregate operation
///
/// Imports keep going when a single entry fails, so the failure is kept
/// here instead of being returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    /// What went wrong
    pub kind: ErrorKind,

    /// Human-readable detail (usually the offending path or URI)
    pub context: String,
}

impl From<&PlaylistError> for LastError {
    fn from(err: &PlaylistError) -> Self {
        Self {
            kind: err.kind(),
            context: err.to_string(),
        }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

/// Result type for playlist operations
pub type Result<T> = std::result::Result<T, PlaylistError>;
