//! RNG module - 7-bag randomizer
//!
//! The bag is a queue of upcoming pieces. Whenever a draw leaves fewer than
//! seven pieces queued, a freshly shuffled set of all seven kinds is appended,
//! so the preview window is always full when observed from outside.
//!
//! Randomness comes from a seeded LCG: the same seed always yields the same
//! piece sequence.

use std::collections::VecDeque;

use crate::pieces::Tetromino;
use crate::types::PieceKind;

/// Number of distinct kinds in one refill
pub const BAG_SIZE: usize = 7;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // A zero state would make the first output a constant
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        // a=1664525, c=1013904223, m=2^32
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Uses the high bits of the state; the low bits of an LCG cycle with
    /// very short periods.
    pub fn next_range(&mut self, max: u32) -> u32 {
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Current generator state
    pub fn state(&self) -> u32 {
        self.state
    }
}

/// Queue of upcoming pieces, refilled one shuffled set at a time
#[derive(Debug, Clone)]
pub struct Bag {
    queue: VecDeque<PieceKind>,
    rng: SimpleRng,
}

impl Bag {
    /// Create a bag holding one shuffled set
    pub fn new(seed: u32) -> Self {
        let mut bag = Self {
            queue: VecDeque::with_capacity(BAG_SIZE * 2),
            rng: SimpleRng::new(seed),
        };
        bag.refill();
        bag
    }

    /// Create a bag that deals `kinds` first, then continues with shuffled sets
    pub fn with_queue(kinds: &[PieceKind], seed: u32) -> Self {
        let mut bag = Self {
            queue: kinds.iter().copied().collect(),
            rng: SimpleRng::new(seed),
        };
        while bag.queue.len() < BAG_SIZE {
            bag.refill();
        }
        bag
    }

    /// Append a uniformly shuffled permutation of all seven kinds
    pub fn refill(&mut self) {
        let mut set = PieceKind::ALL;
        self.rng.shuffle(&mut set);
        self.queue.extend(set);
    }

    /// Pop the front piece, topping the queue back up below seven
    pub fn next_spawn_candidate(&mut self) -> Tetromino {
        if self.queue.is_empty() {
            self.refill();
        }
        let kind = self.queue.pop_front().unwrap_or(PieceKind::I);
        if self.queue.len() < BAG_SIZE {
            self.refill();
        }
        Tetromino::spawn(kind)
    }

    /// Upcoming pieces, front first
    pub fn preview(&self) -> impl Iterator<Item = Tetromino> + '_ {
        self.queue.iter().map(|&kind| Tetromino::spawn(kind))
    }

    /// Next piece without consuming it
    pub fn peek(&self) -> Option<Tetromino> {
        self.queue.front().map(|&kind| Tetromino::spawn(kind))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
