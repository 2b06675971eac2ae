//! Error types for playlist sequencing

use soul_playlist::PlaylistError;
use thiserror::Error;

/// Sequencing errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Index argument outside the playlist or queue
    #[error("Index out of range: {index} (length {len})")]
    OutOfRange { index: usize, len: usize },

    /// No source is selected
    #[error("No current source")]
    NoCurrentSource,

    /// Entry, format or import failure
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
}

/// Result type for sequencing operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
