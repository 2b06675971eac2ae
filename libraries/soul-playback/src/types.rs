//! Core types for playlist sequencing

use serde::{Deserialize, Serialize};
use soul_playlist::{ExtensionResolver, LoadFlags};
use std::fmt;

/// How the next and previous sources are chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Play the current source once, then stop
    TrackOnce,

    /// Repeat the current source
    TrackLoop,

    /// Play to the end of the list, then stop
    AllOnce,

    /// Play the list, wrapping around (default)
    #[default]
    AllLoop,

    /// Shuffled order without immediate repeats
    Random,
}

impl PlaybackMode {
    pub const ALL: [PlaybackMode; 5] = [
        Self::TrackOnce,
        Self::TrackLoop,
        Self::AllOnce,
        Self::AllLoop,
        Self::Random,
    ];

    /// Stable string form
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrackOnce => "track_once",
            Self::TrackLoop => "track_loop",
            Self::AllOnce => "all_once",
            Self::AllLoop => "all_loop",
            Self::Random => "random",
        }
    }

    /// Exact, case-sensitive match of [`PlaybackMode::as_str`]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == s)
    }

    /// Parse, falling back to `AllLoop`
    ///
    /// The flag is false when the fallback was used.
    pub fn from_str_lossy(s: &str) -> (Self, bool) {
        match Self::parse(s) {
            Some(mode) => (mode, true),
            None => (Self::AllLoop, false),
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the playlist engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistConfig {
    /// Initial playback mode (default: AllLoop)
    pub mode: PlaybackMode,

    /// Fixed seed for shuffle history (default: seeded from the clock)
    pub shuffle_seed: Option<u64>,

    /// How directories and playlists are followed on import
    pub load_flags: LoadFlags,

    /// Extension tables used to classify entries
    pub backend: ExtensionResolver,
}
