//! Move selection for a chess bot: an opening book lookup, followed by a
//! fixed depth negamax search of every root move in parallel, bounded by a deadline.
//!
//! ```no_run
//! use negabot_engine::{EngineBuilder, Position};
//!
//! let engine = EngineBuilder::new().depth(3).build().unwrap();
//! let result = engine.best_move(&Position::start_position());
//! println!("bestmove {}", result.uci());
//! ```

pub mod book;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod position;
pub mod search;
pub mod session;
pub mod threads;
pub mod timeman;
pub mod transposition;
pub mod uci;

pub use book::{BookSelection, OpeningBook};
pub use config::EngineConfig;
pub use engine::{Engine, EngineBuilder};
pub use evaluation::Score;
pub use position::{Game, Position};
pub use search::SearchResult;
pub use session::Session;
pub use timeman::Deadline;
pub use transposition::TranspositionTable;
