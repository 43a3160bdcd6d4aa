//! Root move dispatch: every legal root move is searched by its own worker,
//! and the best score reported before the deadline wins.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;

use log::{debug, trace, warn};
use shakmaty::Move;

use crate::error::{self, ErrorKind};
use crate::evaluation::Score;
use crate::position::uci;
use crate::search::{negamax_with_stopper, MoveSource, SearchResult};
use crate::threads::ThreadPool;
use crate::timeman::Deadline;
use crate::transposition::TranspositionTable;
use crate::Position;

/// Score of one root move, relative to the player to move at the root.
#[derive(Debug, Clone)]
pub struct RootScore {
    pub uci_move: String,
    pub score: Score,
    pub nodes: u64,
}

/// What a worker sends back for its root move.
type WorkerReport = error::Result<RootScore>;

/// Searches one root move: `(fen, uci_move, ply, stopper)`.
type RootMoveSearch = fn(&str, &str, u32, &AtomicBool) -> Option<WorkerReport>;

/// Search one root move in isolation.
///
/// The worker rebuilds the root from FEN, applies the move given in UCI
/// and runs negamax one ply shallower with a table of its own.
/// Returns None if `stopper` was set before the search finished.
pub fn search_root_move(
    fen: &str,
    uci_move: &str,
    ply: u32,
    stopper: &AtomicBool,
) -> Option<WorkerReport> {
    let mut position = match Position::parse_fen(fen) {
        Ok(position) => position,
        Err(err) => return Some(Err(err)),
    };
    if let Err(err) = position.do_uci(uci_move) {
        return Some(Err(err));
    }

    let mut tt = TranspositionTable::new();
    let mut nodes = 0;
    let child_score = negamax_with_stopper(
        &mut position,
        ply.saturating_sub(1),
        &mut tt,
        stopper,
        &mut nodes,
    )?;

    Some(Ok(RootScore {
        uci_move: uci_move.to_string(),
        score: -child_score,
        nodes,
    }))
}

/// Search every legal move of `position` to `ply` plies on `pool`,
/// and return the best move whose worker reported before `deadline`.
///
/// Results are taken in completion order. A later result replaces the best
/// only when its score is strictly greater, so among equal scores the first
/// to finish wins; with more than one thread this is not deterministic.
///
/// When the deadline passes, every unfinished worker is told to stop and its
/// result is discarded. A worker that fails counts as finished without a result.
/// `position` is never modified.
pub fn search_root(
    position: &Position,
    ply: u32,
    deadline: &Deadline,
    pool: &ThreadPool,
) -> SearchResult {
    dispatch(position, ply, deadline, pool, search_root_move)
}

fn dispatch(
    position: &Position,
    ply: u32,
    deadline: &Deadline,
    pool: &ThreadPool,
    search_move: RootMoveSearch,
) -> SearchResult {
    let ply = ply.max(1);
    let legal_moves = position.legal_moves();
    let fen = position.to_fen();
    let stopper = Arc::new(AtomicBool::new(false));
    let (sender, receiver) = mpsc::channel::<WorkerReport>();

    let mut dispatched = 0;
    for legal_move in &legal_moves {
        let uci_move = uci(legal_move);
        let fen = fen.clone();
        let stopper = Arc::clone(&stopper);
        let sender = sender.clone();

        let queued = pool.run(move || {
            // Skip work for a search that has already been abandoned.
            if stopper.load(Ordering::Relaxed) {
                return;
            }
            let report = panic::catch_unwind(AssertUnwindSafe(|| {
                search_move(&fen, &uci_move, ply, &stopper)
            }))
            .unwrap_or_else(|_| Some(Err((ErrorKind::WorkerPanicked, &uci_move).into())));

            if let Some(report) = report {
                // The dispatcher may have stopped listening; a late result is dropped.
                let _ = sender.send(report);
            }
        });

        if queued {
            dispatched += 1;
        } else {
            warn!("could not queue root move {}", uci(legal_move));
        }
    }
    // Only worker clones remain, so the channel disconnects once all workers are done.
    drop(sender);

    let mut aggregator = Aggregator::new(position, dispatched);
    aggregator.collect(&receiver, deadline);
    stopper.store(true, Ordering::Relaxed);

    let result = aggregator.into_result(ply, deadline);
    debug!(
        "root search depth {} chose {} score {} ({}/{} moves, {} nodes, {:?}{})",
        ply,
        result.uci(),
        result.score,
        result.completed,
        result.dispatched,
        result.nodes,
        result.elapsed,
        if result.stopped { ", stopped" } else { "" },
    );
    result
}

/// Running reduction of worker reports.
struct Aggregator<'a> {
    position: &'a Position,
    dispatched: usize,
    completed: usize,
    nodes: u64,
    best: Option<(Move, Score)>,
}

impl<'a> Aggregator<'a> {
    fn new(position: &'a Position, dispatched: usize) -> Self {
        Self {
            position,
            dispatched,
            completed: 0,
            nodes: 0,
            best: None,
        }
    }

    fn is_done(&self) -> bool {
        self.completed >= self.dispatched
    }

    /// Wait for reports until all arrive or the deadline passes.
    /// Reports that are already queued at the deadline are still taken,
    /// without blocking, so a zero budget never waits.
    fn collect(&mut self, receiver: &Receiver<WorkerReport>, deadline: &Deadline) {
        while !self.is_done() {
            let received = match deadline.remaining() {
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                Some(remaining) if remaining.is_zero() => Err(RecvTimeoutError::Timeout),
                Some(remaining) => receiver.recv_timeout(remaining),
            };

            match received {
                Ok(report) => self.consider(report),
                Err(RecvTimeoutError::Timeout) => break,
                // Every remaining worker died without reporting.
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        while !self.is_done() {
            match receiver.try_recv() {
                Ok(report) => self.consider(report),
                Err(_) => break,
            }
        }
    }

    fn consider(&mut self, report: WorkerReport) {
        self.completed += 1;

        let root_score = match report {
            Ok(root_score) => root_score,
            Err(err) => {
                warn!("root move worker failed: {err}");
                return;
            }
        };
        trace!("root move {} scored {}", root_score.uci_move, root_score.score);
        self.nodes += root_score.nodes;

        let root_move = match self.position.parse_uci(&root_score.uci_move) {
            Ok(root_move) => root_move,
            Err(err) => {
                warn!("worker reported unknown move {}: {err}", root_score.uci_move);
                return;
            }
        };

        let improves = match &self.best {
            None => true,
            Some((_, best_score)) => root_score.score > *best_score,
        };
        if improves {
            self.best = Some((root_move, root_score.score));
        }
    }

    fn into_result(self, ply: u32, deadline: &Deadline) -> SearchResult {
        let stopped = !self.is_done();
        let (best_move, score) = match self.best {
            Some((best_move, score)) => (Some(best_move), score),
            None => (None, Score::NEG_INFINITY),
        };

        SearchResult {
            best_move,
            score,
            source: MoveSource::Search,
            depth: ply,
            dispatched: self.dispatched,
            completed: self.completed,
            nodes: self.nodes,
            elapsed: deadline.elapsed(),
            stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn worker_rejects_bad_input() {
        let stopper = AtomicBool::new(false);
        let start = Position::start_position().to_fen();

        let bad_fen = search_root_move("not a fen", "e2e4", 2, &stopper);
        assert!(matches!(bad_fen, Some(Err(_))));

        let bad_move = search_root_move(&start, "e2e5", 2, &stopper);
        assert!(matches!(bad_move, Some(Err(_))));
    }

    #[test]
    fn worker_score_is_negated_child() {
        let stopper = AtomicBool::new(false);
        let start = Position::start_position().to_fen();

        let report = search_root_move(&start, "e2e4", 1, &stopper).unwrap().unwrap();
        let mut child = Position::start_position();
        child.do_uci("e2e4").unwrap();
        assert_eq!(report.score, -crate::evaluation::static_evaluate(&child));
        assert_eq!(report.nodes, 1);
    }

    #[test]
    fn failed_workers_count_as_completed() {
        let position = Position::start_position();
        let mut aggregator = Aggregator::new(&position, 2);

        aggregator.consider(Err(crate::error::ErrorKind::Fen.into()));
        aggregator.consider(Ok(RootScore {
            uci_move: "g1f3".to_string(),
            score: Score(0.25),
            nodes: 10,
        }));

        assert!(aggregator.is_done());
        let result = aggregator.into_result(3, &Deadline::infinite());
        assert_eq!(result.uci(), "g1f3");
        assert_eq!(result.completed, 2);
        assert!(!result.stopped);
    }

    #[test]
    fn ties_keep_first_seen() {
        let position = Position::start_position();
        let mut aggregator = Aggregator::new(&position, 3);
        for (uci_move, score) in [("a2a3", -1.0), ("b2b3", 0.5), ("c2c3", 0.5)] {
            aggregator.consider(Ok(RootScore {
                uci_move: uci_move.to_string(),
                score: Score(score),
                nodes: 1,
            }));
        }
        let result = aggregator.into_result(1, &Deadline::infinite());
        assert_eq!(result.uci(), "b2b3");
        assert_eq!(result.score, Score(0.5));
    }

    #[test]
    fn losing_moves_are_still_played() {
        let position = Position::start_position();
        let mut aggregator = Aggregator::new(&position, 1);
        aggregator.consider(Ok(RootScore {
            uci_move: "f2f3".to_string(),
            score: Score::NEG_INFINITY,
            nodes: 1,
        }));
        assert_eq!(aggregator.into_result(2, &Deadline::infinite()).uci(), "f2f3");
    }

    fn panic_on_e2e4(
        fen: &str,
        uci_move: &str,
        ply: u32,
        stopper: &AtomicBool,
    ) -> Option<WorkerReport> {
        if uci_move == "e2e4" {
            panic!("search of {uci_move} failed");
        }
        search_root_move(fen, uci_move, ply, stopper)
    }

    #[test]
    fn panicking_worker_counts_as_completed() {
        let pool = ThreadPool::new(2);
        let position = Position::start_position();

        let result = dispatch(&position, 1, &Deadline::infinite(), &pool, panic_on_e2e4);
        assert_eq!(result.dispatched, 20);
        assert_eq!(result.completed, 20);
        assert!(!result.stopped);
        assert!(!result.is_null());
        assert_ne!(result.uci(), "e2e4");
        // The failed move contributes no nodes.
        assert_eq!(result.nodes, 19);
        assert_eq!(pool.num_threads(), 2);
    }

    #[test]
    fn zero_budget_does_not_block() {
        let pool = ThreadPool::new(2);
        let position = Position::start_position();
        let deadline = Deadline::after(Some(Duration::ZERO));

        let result = search_root(&position, 6, &deadline, &pool);
        assert!(result.elapsed < Duration::from_secs(1));
        assert!(result.stopped);
    }
}
