//! Search functions.

mod negamax;
mod root;

pub use negamax::*;
pub use root::*;

use std::fmt::{self, Display};
use std::time::Duration;

use shakmaty::Move;

use crate::evaluation::Score;
use crate::position::uci;

/// Deepest fixed search depth accepted by the engine.
pub const MAX_DEPTH: u32 = 64;

/// UCI spelling of the null move, returned when there is nothing to play.
pub const NULL_MOVE_UCI: &str = "0000";

/// Where the best move of a search came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MoveSource {
    /// Found in the opening book; no tree search was run.
    Book,
    /// Chosen by the root dispatcher.
    Search,
}

/// The results found from running a search on some root position.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best move to make for a position, or None when there is no move to play.
    pub best_move: Option<Move>,
    /// Score of the best move relative to the player to move at the root.
    /// Negative infinity when there is no best move, zero for book moves.
    pub score: Score,
    /// Whether the move came from the opening book or from search.
    pub source: MoveSource,
    /// Depth in plies that each root move was searched to, including the root ply.
    pub depth: u32,
    /// Number of root moves handed to workers.
    pub dispatched: usize,
    /// Number of root moves whose worker reported back before the deadline,
    /// including failed workers.
    pub completed: usize,
    /// Total number of nodes visited by the workers that reported a score.
    pub nodes: u64,
    /// Total time elapsed from the start to the end of a search.
    pub elapsed: Duration,
    /// Flag that indicates the deadline passed before every worker reported.
    pub stopped: bool,
}

impl SearchResult {
    /// A result for a move taken from the opening book.
    pub fn from_book(best_move: Move, elapsed: Duration) -> Self {
        Self {
            best_move: Some(best_move),
            score: Score::DRAW,
            source: MoveSource::Book,
            depth: 0,
            dispatched: 0,
            completed: 0,
            nodes: 0,
            elapsed,
            stopped: false,
        }
    }

    /// Returns true if there is no move to play.
    pub fn is_null(&self) -> bool {
        self.best_move.is_none()
    }

    /// Best move in UCI notation, `0000` for the null move.
    pub fn uci(&self) -> String {
        self.best_move
            .as_ref()
            .map(uci)
            .unwrap_or_else(|| NULL_MOVE_UCI.to_string())
    }

    /// Get average nodes per second of search.
    pub fn nps(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            (self.nodes as f64 / seconds).round()
        } else {
            0.0
        }
    }
}

impl Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "SearchResult {{")?;
        writeln!(f, "    best_move : {}", self.uci())?;
        writeln!(f, "    score     : {}", self.score)?;
        writeln!(f, "    source    : {:?}", self.source)?;
        writeln!(f, "    depth     : {}", self.depth)?;
        writeln!(f, "    completed : {}/{}", self.completed, self.dispatched)?;
        writeln!(f, "    nodes     : {}", self.nodes)?;
        writeln!(f, "    nps       : {}", self.nps())?;
        writeln!(
            f,
            "    elapsed   : {}.{:03}s",
            self.elapsed.as_secs(),
            self.elapsed.subsec_millis()
        )?;
        writeln!(f, "    stopped   : {}", self.stopped)?;
        write!(f, "}}")
    }
}
