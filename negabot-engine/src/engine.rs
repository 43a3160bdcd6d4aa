//! Engine struct acts as a simplified API for the move selection parts of negabot.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, warn};
use shakmaty::Move;

use crate::book::{BookSelection, OpeningBook};
use crate::config::EngineConfig;
use crate::error;
use crate::position::Position;
use crate::search::{search_root, SearchResult};
use crate::threads::ThreadPool;
use crate::timeman::Deadline;

/// EngineBuilder allows for parameters of an Engine to be set and built once,
/// avoiding repeating costly initialization steps of making then changing an Engine.
///
/// Default values are those of [`EngineConfig::default`]:
///
/// * `depth`: 4
/// * `max_time`: 30 seconds
/// * `workers`: 8
/// * `book`: `book/openings.bin`, best weight selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a new default EngineBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Validate the parameters, then create and return a new Engine.
    pub fn build(&self) -> error::Result<Engine> {
        let config = self.config.clone().validate()?;
        let pool = ThreadPool::new(config.workers);
        info!(
            "engine ready: depth {}, {} workers, book {}",
            config.depth,
            pool.num_threads(),
            config
                .book
                .as_ref()
                .map_or_else(|| "disabled".to_string(), |path| path.display().to_string()),
        );

        Ok(Engine { config, pool })
    }

    /// Set the fixed search depth in plies.
    pub fn depth(mut self, depth: u32) -> Self {
        self.config.depth = depth;
        self
    }

    /// Set the time budget of each move. None searches without a limit.
    pub fn max_time(mut self, max_time: Option<Duration>) -> Self {
        self.config.max_time = max_time.map(|budget| budget.as_secs_f64());
        self
    }

    /// Set the number of search worker threads.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the opening book file. None disables the book.
    pub fn book(mut self, book: Option<PathBuf>) -> Self {
        self.config.book = book;
        self
    }

    /// Set how a move is chosen among several book moves.
    pub fn book_selection(mut self, book_selection: BookSelection) -> Self {
        self.config.book_selection = book_selection;
        self
    }
}

/// Engine selects moves: the opening book is consulted first, and on a miss
/// every root move is searched in parallel on a pool of worker threads.
///
/// The worker pool is created once and reused by every call. Each call gets its
/// own deadline, result channel, stop flag and transposition tables, so no
/// search state is carried from one move to the next.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    pool: ThreadPool,
}

impl Engine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let pool = ThreadPool::new(config.workers);
        Self { config, pool }
    }

    /// Returns reference to current configuration of engine.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of live worker threads.
    pub fn num_workers(&self) -> usize {
        self.pool.num_threads()
    }

    /// Update the fixed search depth used by the next search.
    pub fn set_depth(&mut self, depth: u32) {
        self.config.depth = depth;
    }

    /// Update the time budget used by the next search.
    pub fn set_max_time(&mut self, max_time: Option<Duration>) {
        self.config.max_time = max_time.map(|budget| budget.as_secs_f64());
    }

    /// Resize the worker pool. The old pool is shut down once its threads are idle.
    pub fn set_workers(&mut self, workers: usize) {
        let workers = workers.max(1);
        self.config.workers = workers;
        if workers != self.pool.num_threads() {
            self.pool = ThreadPool::new(workers);
        }
    }

    /// Select the move to play in `position`.
    ///
    /// The deadline is fixed when the call starts and covers the book lookup as well
    /// as the search. A null move (`best_move == None`) means there is no legal
    /// move, or that no root move was searched in time.
    pub fn best_move(&self, position: &Position) -> SearchResult {
        let deadline = Deadline::after(self.config.time_budget());

        if let Some(book_move) = self.book_move(position) {
            return SearchResult::from_book(book_move, deadline.elapsed());
        }

        search_root(position, self.config.depth, &deadline, &self.pool)
    }

    /// Move from the configured opening book. The book file is opened for this
    /// lookup only. A book that cannot be read is reported and treated as a miss.
    pub fn book_move(&self, position: &Position) -> Option<Move> {
        let path = self.config.book.as_ref()?;

        let lookup = OpeningBook::open(path)
            .and_then(|mut book| book.lookup(position, self.config.book_selection));

        match lookup {
            Ok(book_move) => book_move,
            Err(err) => {
                warn!("opening book {} unusable: {err}", path.display());
                None
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        debug!("engine shutting down {} workers", self.pool.num_threads());
    }
}
