//! Transposition Table.

use std::collections::HashMap;

use crate::evaluation::Score;
use crate::position::HashKind;

/// Entry contains information about a previously searched position.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Entry {
    pub ply: u32,     // The depth searched to in this Position's subtree.
    pub score: Score, // Score relative to the player to move in the hashed position.
}

impl Entry {
    /// Returns new Entry from provided information.
    pub fn new(ply: u32, score: Score) -> Self {
        Self { ply, score }
    }

    /// Returns true if this entry may answer a search of `ply` remaining depth.
    /// A subtree searched at least as deep as requested is authoritative.
    pub fn satisfies(&self, ply: u32) -> bool {
        self.ply >= ply
    }
}

/// A Transposition Table (tt) memoizing previously evaluated positions
/// for the duration of one search.
///
/// A table belongs to exactly one search and is passed down its recursion by
/// mutable reference. Parallel searches each own a separate table, so the
/// table has no locking and no eviction.
///
/// Example:
/// ```rust
/// # use negabot_engine::transposition::{Entry, TranspositionTable};
/// # use negabot_engine::evaluation::Score;
/// let mut tt = TranspositionTable::new();
/// tt.replace(0x463b96181691fc9c, Entry::new(2, Score(0.5)));
///
/// assert_eq!(tt.get(0x463b96181691fc9c).map(|entry| entry.ply), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranspositionTable {
    transpositions: HashMap<HashKind, Entry>,
    hits: u64,
}

impl TranspositionTable {
    /// Returns a new, empty TranspositionTable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry stored for a hash, if any.
    pub fn get(&self, hash: HashKind) -> Option<&Entry> {
        self.transpositions.get(&hash)
    }

    /// Returns the score of an entry that satisfies a search of `ply` depth,
    /// counting the hit.
    pub fn probe(&mut self, hash: HashKind, ply: u32) -> Option<Score> {
        let score = self
            .transpositions
            .get(&hash)
            .filter(|entry| entry.satisfies(ply))
            .map(|entry| entry.score);

        if score.is_some() {
            self.hits += 1;
        }
        score
    }

    /// Store an entry for a hash, overwriting whatever was there.
    pub fn replace(&mut self, hash: HashKind, entry: Entry) {
        self.transpositions.insert(hash, entry);
    }

    /// Number of stored positions.
    pub fn len(&self) -> usize {
        self.transpositions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transpositions.is_empty()
    }

    /// Number of probes answered from the table.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Remove all entries and reset the hit counter.
    pub fn clear(&mut self) {
        self.transpositions.clear();
        self.hits = 0;
    }
}
