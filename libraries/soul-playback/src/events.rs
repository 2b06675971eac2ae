//! Playlist events
//!
//! The engine never calls out when its state changes. Instead it records
//! events which the owner drains with
//! [`PlaylistEngine::drain_events`](crate::PlaylistEngine::drain_events)
//! on its own thread.

use crate::types::PlaybackMode;
use serde::{Deserialize, Serialize};

/// State changes reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaylistEvent {
    /// Playback mode changed
    ModeChanged {
        mode: PlaybackMode,
    },

    /// Current source changed (`None` = no current source)
    IndexChanged {
        index: Option<usize>,
    },

    /// Queue was modified; `length` is the new queue length
    QueueChanged {
        length: usize,
    },

    /// Sources were added, removed or reordered
    ListChanged {
        length: usize,
    },
}
