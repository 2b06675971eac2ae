//! Random permutations for shuffle history and list shuffling
//!
//! Uses Fisher-Yates (`SliceRandom::shuffle`) over a seedable RNG so tests
//! can reproduce an order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seedable shuffler owned by one engine
#[derive(Debug, Clone)]
pub struct Shuffler {
    rng: StdRng,
}

impl Shuffler {
    /// Create a shuffler; `None` seeds from the wall clock
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(clock_seed);
        tracing::debug!("Shuffle seed {}", seed);
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }

    /// A shuffled copy
    pub fn permutation<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut block = items.to_vec();
        self.shuffle(&mut block);
        block
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_order() {
        let items: Vec<u32> = (0..20).collect();
        let a = Shuffler::new(Some(42)).permutation(&items);
        let b = Shuffler::new(Some(42)).permutation(&items);
        assert_eq!(a, b);
    }

    #[test]
    fn permutation_preserves_items() {
        let items: Vec<u32> = (0..50).collect();
        let block = Shuffler::new(Some(1)).permutation(&items);

        assert_eq!(block.len(), items.len());
        let unique: HashSet<u32> = block.iter().copied().collect();
        assert_eq!(unique.len(), items.len());
    }

    #[test]
    fn shuffle_changes_order() {
        let items: Vec<u32> = (0..20).collect();
        let block = Shuffler::new(Some(3)).permutation(&items);

        // 1 in 20! chance of being identical
        assert_ne!(block, items);
    }

    #[test]
    fn empty_and_single() {
        let mut shuffler = Shuffler::new(None);
        assert!(shuffler.permutation::<u32>(&[]).is_empty());
        assert_eq!(shuffler.permutation(&[9]), vec![9]);
    }
}
