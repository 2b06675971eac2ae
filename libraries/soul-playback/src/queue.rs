//! Play queue
//!
//! Sources queued here are played before the playback mode is consulted.
//! The queue holds source identities, never owning copies; the engine
//! purges an identity when its source leaves the playlist.

use soul_playlist::SourceId;
use std::collections::VecDeque;

/// FIFO override queue
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    ids: VecDeque<SourceId>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the back
    pub fn push(&mut self, id: SourceId) {
        self.ids.push_back(id);
    }

    /// Insert at `position`, clamped to the queue length
    pub fn insert(&mut self, position: usize, id: SourceId) {
        let position = position.min(self.ids.len());
        self.ids.insert(position, id);
    }

    /// Remove the entry at a queue position
    pub fn remove_at(&mut self, position: usize) -> Option<SourceId> {
        self.ids.remove(position)
    }

    /// Remove the first occurrence of `id`
    pub fn remove_first(&mut self, id: SourceId) -> bool {
        match self.ids.iter().position(|&queued| queued == id) {
            Some(position) => {
                self.ids.remove(position);
                true
            }
            None => false,
        }
    }

    /// Remove every occurrence of `id`, returning how many were removed
    pub fn remove_all(&mut self, id: SourceId) -> usize {
        let before = self.ids.len();
        self.ids.retain(|&queued| queued != id);
        before - self.ids.len()
    }

    pub fn front(&self) -> Option<SourceId> {
        self.ids.front().copied()
    }

    pub fn pop_front(&mut self) -> Option<SourceId> {
        self.ids.pop_front()
    }

    pub fn iter(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
