//! Repetition history of a game or search line.

use arrayvec::ArrayVec;

use crate::position::HashKind;

// The greatest number of plies of history supported, 2048 ply or 1024 moves.
// Games are bounded well below this by the 75-move rule unless captures keep
// resetting the clock.
pub const MAX_HISTORY: usize = 2048;

type HashHistory = ArrayVec<HashKind, MAX_HISTORY>;
type Unrepeatables = ArrayVec<usize, MAX_HISTORY>;

/// History tracks previously visited positions to detect repetition draws.
/// It is stateful, in that functions assume the next interaction comes from the next
/// possible move in a played game.
///
/// It contains the hashes of all previously visited positions,
/// and the indices of positions which cannot be repeated in future positions.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct History {
    hash_history: HashHistory,    // All visited position hashes in order.
    unrepeatables: Unrepeatables, // Stack of unrepeatable position indices.
    head: usize,                  // Most recent unrepeatable position.
}

impl History {
    /// Create a new empty History.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions in history.
    pub fn len(&self) -> usize {
        self.hash_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash_history.is_empty()
    }

    /// Returns true if no more positions can be pushed.
    pub fn is_full(&self) -> bool {
        self.hash_history.is_full()
    }

    /// Pushes the hash of the position a move was made from.
    /// `is_unrepeatable` is true for zeroing moves (captures and pawn moves),
    /// after which no earlier position can occur again.
    ///
    /// # Panics
    ///
    /// Panics if history already holds `MAX_HISTORY` positions.
    pub fn push(&mut self, hash: HashKind, is_unrepeatable: bool) {
        self.hash_history.push(hash);

        if is_unrepeatable {
            self.unrepeatables.push(self.head);
            self.head = self.hash_history.len();
        }
    }

    /// Pops a position from history stack. If the popped item was the most recent unrepeatable,
    /// then replace it with the previous unrepeatable index.
    pub fn pop(&mut self) {
        self.hash_history.pop();

        if self.head > self.hash_history.len() {
            self.head = self.unrepeatables.pop().unwrap_or(0);
        }
    }

    /// Returns true if the position occurs in history at least `count` times.
    /// Only history since the last unrepeatable move is checked.
    pub fn contains_n(&self, hash: HashKind, count: usize) -> bool {
        self.hash_history[self.head..]
            .iter()
            .filter(|old_hash| **old_hash == hash)
            .nth(count.saturating_sub(1))
            .is_some()
    }

    /// Returns true if the position has occurred four times before,
    /// making the current occurrence the fifth.
    pub fn is_fivefold_repetition(&self, hash: HashKind) -> bool {
        self.contains_n(hash, 4)
    }
}
