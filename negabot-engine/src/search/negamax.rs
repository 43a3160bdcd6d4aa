//! Fixed depth Negamax implementation of Minimax, without pruning.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::evaluation::{static_evaluate, Score};
use crate::transposition::{Entry, TranspositionTable};
use crate::Position;

/// Negamax searches every line to a fixed depth and returns the score of
/// `position` relative to its player to move.
///
/// The transposition table is owned by the caller for the duration of one search.
///
/// # Panics
///
/// Panics if `position` already holds nearly `MAX_HISTORY` plies of history.
pub fn negamax(position: &mut Position, ply: u32, tt: &mut TranspositionTable) -> Score {
    let mut nodes = 0;
    let never_stop = AtomicBool::new(false);

    // A stopper that is never set cannot abort the search.
    negamax_with_stopper(position, ply, tt, &never_stop, &mut nodes).unwrap_or(Score::DRAW)
}

/// Negamax that gives up as soon as `stopper` is set, returning None.
/// Results computed before the stop stay in the table; the aborted line does not.
/// `nodes` counts every visited position, including table hits.
pub fn negamax_with_stopper(
    position: &mut Position,
    ply: u32,
    tt: &mut TranspositionTable,
    stopper: &AtomicBool,
    nodes: &mut u64,
) -> Option<Score> {
    negamax_impl(position, tt, stopper, nodes, ply)
}

/// The player whose turn it is to move for a position is always treated as the maxing player.
/// negamax_impl returns the max possible score of the current maxing player.
/// Therefore, when interpreting the score of a child node, the score needs to be negated.
///
/// Parameters:
///
/// position: current position to search.
/// tt: Transposition Table used for recalling search history.
/// stopper: Tells the search to stop early from an external source.
/// nodes: Counter for number of nodes visited in search.
/// ply: remaining depth to search to.
fn negamax_impl(
    position: &mut Position,
    tt: &mut TranspositionTable,
    stopper: &AtomicBool,
    nodes: &mut u64,
    ply: u32,
) -> Option<Score> {
    if stopper.load(Ordering::Relaxed) {
        return None;
    }
    *nodes += 1;

    let hash = position.hash();
    if let Some(score) = tt.probe(hash, ply) {
        return Some(score);
    }

    // Stop search at terminal nodes and at the last depth.
    if ply == 0 || position.is_game_over() {
        let score = static_evaluate(position);
        tt.replace(hash, Entry::new(ply, score));
        return Some(score);
    }

    let legal_moves = position.legal_moves();
    let mut best_score = Score::NEG_INFINITY;

    // For each child of current position, recursively find maxing move.
    for legal_move in &legal_moves {
        position.do_move(legal_move);
        let child_score = negamax_impl(position, tt, stopper, nodes, ply - 1);
        position.undo_move();

        best_score = best_score.max(-child_score?);
    }

    tt.replace(hash, Entry::new(ply, best_score));
    Some(best_score)
}
