//! Random-mode play history
//!
//! The history is a sequence of whole blocks, each a full permutation of the
//! playlist. Blocks are appended when navigating past the end and prepended
//! when navigating before the start, so `next`/`prev` in random mode always
//! walk a fixed order that can be replayed in both directions.

use soul_playlist::SourceId;

/// Block-structured shuffle history
///
/// Invariant: `order.len()` is always a multiple of `block_len`, since
/// blocks are only ever added whole and the history is cleared whenever the
/// playlist length changes.
#[derive(Debug, Clone, Default)]
pub struct History {
    order: Vec<SourceId>,

    /// Position of the current source in `order`
    position: Option<usize>,

    /// Length of every block (playlist length when generated)
    block_len: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block, avoiding a repeat across the seam
    pub fn append_block(&mut self, mut block: Vec<SourceId>) {
        if block.is_empty() {
            return;
        }
        if block.len() >= 2 && self.order.last() == block.first() {
            block.swap(0, 1);
        }
        self.block_len = block.len();
        self.order.extend(block);
    }

    /// Prepend a block, avoiding a repeat across the seam
    ///
    /// The current position shifts by the block length.
    pub fn prepend_block(&mut self, mut block: Vec<SourceId>) {
        let len = block.len();
        if len == 0 {
            return;
        }
        if len >= 2 && self.order.first() == block.last() {
            block.swap(len - 1, len - 2);
        }
        self.block_len = len;
        block.extend(self.order.drain(..));
        self.order = block;
        self.position = self.position.map(|pos| pos + len);
    }

    /// Locate `id`, starting at the block that holds the current position
    ///
    /// Falls back to a full scan when the source is not in that block or
    /// anywhere after it.
    pub fn find(&self, id: SourceId) -> Option<usize> {
        let start = match (self.position, self.block_len) {
            (Some(pos), len) if len > 0 => pos - pos % len,
            _ => 0,
        };

        self.order[start.min(self.order.len())..]
            .iter()
            .position(|&candidate| candidate == id)
            .map(|offset| start + offset)
            .or_else(|| self.order.iter().position(|&candidate| candidate == id))
    }

    /// Move `id` to the front of the history and point at it
    ///
    /// Meant for a history holding a single fresh block.
    pub fn start_at(&mut self, id: SourceId) -> bool {
        let Some(pos) = self.order.iter().position(|&candidate| candidate == id) else {
            return false;
        };
        self.order.swap(0, pos);
        self.position = Some(0);
        true
    }

    pub fn get(&self, position: usize) -> Option<SourceId> {
        self.order.get(position).copied()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<usize>) {
        self.position = position.filter(|&pos| pos < self.order.len());
    }

    /// Source at the current position
    pub fn current(&self) -> Option<SourceId> {
        self.position.and_then(|pos| self.get(pos))
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[SourceId] {
        &self.order
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.position = None;
        self.block_len = 0;
    }
}
