//! Soul Player - Playlist Sequencing
//!
//! Decides what plays next for a playlist session.
//!
//! This crate provides:
//! - Five playback modes (track once/loop, all once/loop, random)
//! - Non-repeating random order built from whole shuffle blocks
//! - A play queue that overrides the mode for forward moves
//! - Directory-relative navigation (first in dir, next/previous dir)
//! - Adding files, URLs, directories and playlists through `soul-playlist`
//! - Event reporting for the owning thread to poll
//!
//! # Architecture
//!
//! The engine is a synchronous state machine with no threads and no open
//! files between calls. Opening audio is left to the platform through
//! [`soul_playlist::SourceOpener`]; classification goes through an
//! [`soul_playlist::AudioBackend`] handed to the constructor.
//!
//! # Example
//!
//! ```rust
//! use soul_playback::{PlaybackMode, PlaylistConfig, PlaylistEngine, PlaylistEvent};
//!
//! let mut engine = PlaylistEngine::new(PlaylistConfig::default());
//! for path in ["/music/a.mp3", "/music/b.mp3", "/music/c.mp3"] {
//!     engine.add_file(path).unwrap();
//! }
//!
//! engine.set_index(2).unwrap();
//! assert_eq!(engine.next_index(), Some(0));
//!
//! engine.set_mode(PlaybackMode::AllOnce);
//! assert!(!engine.move_to_next());
//! assert_eq!(engine.current_index(), None);
//!
//! let events = engine.drain_events();
//! assert!(events.contains(&PlaylistEvent::ModeChanged { mode: PlaybackMode::AllOnce }));
//! ```

mod error;
mod events;
mod history;
mod manager;
mod queue;
mod shuffle;
mod types;

// Public exports
pub use error::{PlaybackError, Result};
pub use events::PlaylistEvent;
pub use history::History;
pub use manager::{PlaylistEngine, SharedBackend};
pub use queue::PlayQueue;
pub use shuffle::Shuffler;
pub use types::{PlaybackMode, PlaylistConfig};

// Re-export the data model the engine works with
pub use soul_playlist;
