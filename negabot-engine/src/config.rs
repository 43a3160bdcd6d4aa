//! Engine configuration, with defaults and TOML file loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::book::BookSelection;
use crate::error::{self, ErrorKind};
use crate::search::MAX_DEPTH;
use crate::timeman::DEFAULT_BUDGET;

/// Default fixed search depth in plies.
pub const DEFAULT_DEPTH: u32 = 4;
/// Default number of search worker threads.
pub const DEFAULT_WORKERS: usize = 8;
/// Default location of the Polyglot opening book.
pub const DEFAULT_BOOK: &str = "book/openings.bin";

/// Parameters for move selection.
///
/// Every field has a default, so a TOML file only names what it changes:
///
/// ```toml
/// depth = 3
/// max_time = 5.0      # seconds, omit for the 30 second default
/// workers = 4
/// book = "book/openings.bin"   # "" disables the book
/// book_selection = "weighted-random"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Fixed search depth in plies, counting the root move.
    pub depth: u32,
    /// Time budget per move in seconds. None searches without a limit.
    pub max_time: Option<f64>,
    /// Number of search worker threads.
    pub workers: usize,
    /// Polyglot book consulted before searching. None disables the book.
    pub book: Option<PathBuf>,
    /// How to choose among several book moves.
    pub book_selection: BookSelection,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            max_time: Some(DEFAULT_BUDGET.as_secs_f64()),
            workers: DEFAULT_WORKERS,
            book: Some(PathBuf::from(DEFAULT_BOOK)),
            book_selection: BookSelection::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> error::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()
    }

    /// Read a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> error::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            (
                ErrorKind::Config,
                format!("cannot read {}: {err}", path.display()),
            )
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that every value is usable.
    /// An empty book path disables the book.
    pub fn validate(mut self) -> error::Result<Self> {
        if self.depth > MAX_DEPTH {
            return Err((
                ErrorKind::Config,
                format!("depth {} exceeds maximum {MAX_DEPTH}", self.depth),
            )
                .into());
        }
        if self.workers == 0 {
            return Err((ErrorKind::Config, "workers must be at least 1").into());
        }
        if let Some(max_time) = self.max_time {
            if !max_time.is_finite() || max_time < 0.0 {
                return Err((ErrorKind::Config, format!("invalid max_time {max_time}")).into());
            }
        }
        if matches!(&self.book, Some(path) if path.as_os_str().is_empty()) {
            self.book = None;
        }
        Ok(self)
    }

    /// The time budget as a Duration.
    pub fn time_budget(&self) -> Option<Duration> {
        self.max_time
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
    }
}
