//! Negabot Engine error type.

use std::error;
use std::fmt::{self, Display};
use std::io;
use std::result;

use shakmaty::fen::ParseFenError;
use shakmaty::{Chess, PositionError};
use thiserror::Error;

/// Negabot Engine generic result type.
pub type Result<T> = result::Result<T, Error>;

/// A list specifying general errors for the Negabot engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Fen string could not be parsed.
    Fen,
    /// Fen parsed, but does not describe a legal chess position.
    PositionInvalid,
    /// Uci move text could not be parsed or is not legal in the position.
    IllegalMove,

    /// The engine tracks a finite number of plies of repetition history.
    /// That limit has been exceeded.
    MoveHistoryExceeded,

    /// Opening book file could not be read.
    BookIo,
    /// Opening book file is not a whole number of Polyglot records.
    BookMalformed,

    /// Configuration file could not be read or parsed.
    Config,

    /// A search worker panicked before reporting a score.
    WorkerPanicked,

    // An illegal move was provided, and could not be applied to some base position.
    GameIllegalMove,

    UciNoCommand,
    UciUnknownCommand,
    UciNoArgument,
    UciPositionMalformed,
    UciCannotParseInt,
    UciInvalidOption,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Fen => "fen",
            ErrorKind::PositionInvalid => "position invalid",
            ErrorKind::IllegalMove => "illegal move",

            ErrorKind::MoveHistoryExceeded => "move history exceeded",

            ErrorKind::BookIo => "book io",
            ErrorKind::BookMalformed => "book malformed",

            ErrorKind::Config => "config",

            ErrorKind::WorkerPanicked => "worker panicked",

            ErrorKind::GameIllegalMove => "game history illegal move",

            ErrorKind::UciNoCommand => "uci no command",
            ErrorKind::UciUnknownCommand => "uci unknown command",
            ErrorKind::UciNoArgument => "uci no argument",
            ErrorKind::UciPositionMalformed => "uci position malformed",
            ErrorKind::UciCannotParseInt => "uci cannot parse integer",
            ErrorKind::UciInvalidOption => "uci invalid option",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The primary and general error type for the Negabot Engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Simple(ErrorKind),
    #[error("{0}: {1}")]
    Message(ErrorKind, String),
    #[error("{0}, error: {1}")]
    Custom(ErrorKind, #[source] Box<dyn error::Error + Send + Sync>),
}

impl Error {
    pub fn new<E>(error_kind: ErrorKind, inner_error: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self::Custom(error_kind, inner_error.into())
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Simple(kind) | Error::Message(kind, _) | Error::Custom(kind, _) => *kind,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(error_kind: ErrorKind) -> Self {
        Self::Simple(error_kind)
    }
}

impl<S: ToString> From<(ErrorKind, S)> for Error {
    fn from((error_kind, stringable): (ErrorKind, S)) -> Self {
        Self::Message(error_kind, stringable.to_string())
    }
}

impl From<ParseFenError> for Error {
    fn from(error: ParseFenError) -> Self {
        Self::Message(ErrorKind::Fen, error.to_string())
    }
}

impl From<PositionError<Chess>> for Error {
    fn from(error: PositionError<Chess>) -> Self {
        Self::Message(ErrorKind::PositionInvalid, error.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::new(ErrorKind::BookIo, error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::new(ErrorKind::Config, error)
    }
}
