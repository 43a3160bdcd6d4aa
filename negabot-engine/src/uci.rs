//! Universal Chess Interface, the subset needed to drive the engine from a GUI.

use std::fmt::{self, Display};
use std::io::{self, Write};
use std::str::{FromStr, SplitWhitespace};
use std::time::Duration;

use shakmaty::Move;

use crate::error::{self, ErrorKind};
use crate::position::{uci, Game, Position};

/// UciCommands commands from an external program sent to this chess engine.
#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Pos(Game),
    Go(SearchControls),
    Stop,
    Quit,
}

impl UciCommand {
    /// Parse a single input line into a UciCommand if possible.
    pub fn parse_command(input_str: &str) -> error::Result<Self> {
        let mut input = input_str.split_whitespace();
        let head = input.next().ok_or(ErrorKind::UciNoCommand)?;

        match head {
            "uci" => Ok(UciCommand::Uci),
            "isready" => Ok(UciCommand::IsReady),
            "ucinewgame" => Ok(UciCommand::UciNewGame),
            "position" => Self::parse_pos(input),
            "go" => Self::parse_go(input),
            "stop" => Ok(UciCommand::Stop),
            "quit" => Ok(UciCommand::Quit),
            _ => Err((ErrorKind::UciUnknownCommand, head).into()),
        }
    }

    /// Extract a `position` command if possible.
    /// command: `position [fen fen_str | startpos] (moves move_list ...)`
    fn parse_pos(mut input: SplitWhitespace) -> error::Result<Self> {
        let position_input = input.next().ok_or((
            ErrorKind::UciNoArgument,
            "position missing description [fen | startpos]",
        ))?;

        let base_position = match position_input {
            "startpos" => Position::start_position(),
            "fen" => {
                let fields: Vec<&str> = input
                    .by_ref()
                    .take_while(|&token| token != "moves")
                    .collect();
                if fields.is_empty() {
                    return Err(ErrorKind::UciPositionMalformed.into());
                }
                let position = Position::parse_fen(&fields.join(" "))?;
                // `moves` was consumed by take_while, if present.
                return Game::new(position, input).map(UciCommand::Pos);
            }
            _ => return Err(ErrorKind::UciPositionMalformed.into()),
        };

        match input.next() {
            Some("moves") => Game::new(base_position, input).map(UciCommand::Pos),
            None => Ok(UciCommand::Pos(Game::from(base_position))),
            Some(token) => Err((ErrorKind::UciPositionMalformed, token).into()),
        }
    }

    /// Extract a `go` command if possible.
    /// command: `go [depth | movetime | wtime | btime | winc | binc | movestogo | nodes | mate | infinite]*`
    ///
    /// Only depth, movetime and infinite change the search; clock fields are accepted and ignored.
    fn parse_go(mut input: SplitWhitespace) -> error::Result<Self> {
        const IGNORED_WITH_ARG: [&str; 7] =
            ["wtime", "btime", "winc", "binc", "movestogo", "nodes", "mate"];

        let mut controls = SearchControls::default();

        while let Some(input_str) = input.next() {
            match input_str {
                "depth" => controls.depth = Some(parse_u32(input.next())?),
                "movetime" => controls.move_time = Some(parse_u32(input.next())?),
                "infinite" => controls.infinite = true,
                "ponder" => {}
                _ if IGNORED_WITH_ARG.contains(&input_str) => {
                    parse_u32(input.next())?;
                }
                _ => return Err((ErrorKind::UciInvalidOption, input_str).into()),
            }
        }

        Ok(UciCommand::Go(controls))
    }
}

fn parse_u32(token: Option<&str>) -> error::Result<u32> {
    token
        .ok_or(ErrorKind::UciNoArgument)?
        .parse()
        .map_err(|err| (ErrorKind::UciCannotParseInt, err).into())
}

impl FromStr for UciCommand {
    type Err = error::Error;
    fn from_str(s: &str) -> error::Result<Self> {
        Self::parse_command(s)
    }
}

/// Search limits sent with `go`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SearchControls {
    pub depth: Option<u32>,
    /// Milliseconds.
    pub move_time: Option<u32>,
    pub infinite: bool,
}

impl SearchControls {
    /// Time budget these controls ask for. `Some(None)` means search without a limit,
    /// `None` leaves the engine's own budget in place.
    pub fn time_budget(&self) -> Option<Option<Duration>> {
        if self.infinite {
            Some(None)
        } else {
            self.move_time
                .map(|millis| Some(Duration::from_millis(u64::from(millis))))
        }
    }
}

/// Engine to external program communication.
#[derive(Debug, Clone)]
pub enum UciResponse {
    Id(String, String),
    UciOk,
    ReadyOk,
    /// None is sent as the null move.
    BestMove(Option<Move>),
    InfoString(String),
}

impl UciResponse {
    pub fn new_id(name: &str, author: &str) -> Self {
        Self::Id(name.into(), author.into())
    }

    /// Write this UciResponse to `writer` and flush it.
    pub fn send<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{self}")?;
        writer.flush()
    }
}

impl Display for UciResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Id(name, author) => {
                writeln!(f, "id name {name}")?;
                writeln!(f, "id author {author}")
            }
            Self::UciOk => writeln!(f, "uciok"),
            Self::ReadyOk => writeln!(f, "readyok"),
            Self::BestMove(Some(move_)) => writeln!(f, "bestmove {}", uci(move_)),
            Self::BestMove(None) => writeln!(f, "bestmove 0000"),
            Self::InfoString(s) => writeln!(f, "info string {s}"),
        }
    }
}
