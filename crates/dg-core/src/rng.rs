//! Random number generation for level generation
//!
//! Everything random in a generation pass goes through [`RandomSource`], so a
//! run is replayable from its seed and tests can feed fixed sequences.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of randomness threaded through the batcher and materializer
pub trait RandomSource {
    /// Uniform draw from `0..n`; an empty range draws 0
    fn rn2(&mut self, n: u32) -> u32;

    /// One chance in `n`
    fn one_in(&mut self, n: u32) -> bool {
        self.rn2(n) == 0
    }

    /// Shuffle a slice in place (Fisher-Yates, back to front)
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rn2(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }

    /// Pick an index with probability proportional to its weight
    ///
    /// Returns None if the weights are empty or all zero. Totals past
    /// `u32::MAX` are clamped, which leaves the trailing weight unreachable.
    fn choose_weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = u64::from(self.rn2(u32::try_from(total).unwrap_or(u32::MAX)));
        for (idx, &w) in weights.iter().enumerate() {
            let w = u64::from(w);
            if roll < w {
                return Some(idx);
            }
            roll -= w;
        }
        None
    }

    /// Order all indices by repeated weighted draws without replacement
    ///
    /// Zero-weight entries trail the drawn ones in their original order.
    fn weighted_order(&mut self, weights: &[u32]) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..weights.len()).collect();
        let mut order = Vec::with_capacity(weights.len());
        while !remaining.is_empty() {
            let current: Vec<u32> = remaining.iter().map(|&i| weights[i]).collect();
            match self.choose_weighted(&current) {
                Some(pick) => order.push(remaining.remove(pick)),
                None => {
                    order.append(&mut remaining);
                }
            }
        }
        order
    }
}

/// ChaCha8 generator behind every real generation pass
///
/// Only the seed is kept alongside the stream; a [`Level`](crate::Level)
/// records it so the pass can be replayed.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed the stream was started from
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for GameRng {
    fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }
}

/// Replays a fixed sequence of raw values, cycling when exhausted
///
/// Each draw returns `value % n`; an empty script always yields 0. Use
/// [`ScriptedRng::identity_shuffle`] when a test needs a shuffle to keep the
/// input order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    values: Vec<u32>,
    pos: usize,
}

impl ScriptedRng {
    pub fn new(values: Vec<u32>) -> Self {
        Self { values, pos: 0 }
    }

    /// Script that leaves a shuffle of `len` items in place
    ///
    /// The back-to-front shuffle swaps `i` with the draw from `0..=i`, so
    /// drawing `i` each step is a no-op.
    pub fn identity_shuffle(len: usize) -> Self {
        Self::new((1..len as u32).rev().collect())
    }

    /// Append more raw values after the current script
    pub fn then(mut self, more: impl IntoIterator<Item = u32>) -> Self {
        self.values.extend(more);
        self
    }

    /// Number of values consumed so far
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl RandomSource for ScriptedRng {
    fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 || self.values.is_empty() {
            return 0;
        }
        let raw = self.values[self.pos % self.values.len()];
        self.pos += 1;
        raw % n
    }
}
